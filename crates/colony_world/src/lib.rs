//! Content loading, world generation and state files shared by the CLI.

use anyhow::{Context, Result};
use colony_core::{
    ActorId, BranchDef, BuildingId, BuildingState, ColonyId, ColonyState, Constants, Counters,
    DimensionId, GameContent, GameState, MetaState, ResearchLedger, ResearchRegistry,
    StashInventory,
};
use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Dimension every generated colony is founded in.
pub const HOME_DIMENSION: &str = "overworld";

#[derive(Deserialize)]
struct BranchesFile {
    content_version: String,
    branches: Vec<BranchDef>,
}

/// Validates loaded content, panicking on any authoring error.
///
/// Catches mistakes like a branch listed twice, a depth with a zero base time,
/// or constants that would leave research unable to progress.
pub fn validate_content(content: &GameContent) {
    let c = &content.constants;
    assert!(c.base_research_time > 0, "base_research_time must be positive");
    assert!(
        c.progress_per_researcher_per_tick > 0,
        "progress_per_researcher_per_tick must be positive",
    );
    assert!(c.stash_slots > 0, "stash_slots must be positive");

    let mut seen = HashSet::new();
    for branch in &content.branches {
        assert!(!branch.id.0.is_empty(), "research branch has empty id");
        assert!(
            seen.insert(&branch.id),
            "research branch '{}' is defined more than once",
            branch.id,
        );
        assert!(
            !branch.base_times.is_empty(),
            "research branch '{}' has no depths",
            branch.id,
        );
        for (depth, base_time) in branch.base_times.iter().enumerate() {
            assert!(
                *base_time > 0,
                "research branch '{}' depth {depth} has a zero base time",
                branch.id,
            );
        }
    }
}

pub fn load_content(content_dir: &str) -> Result<GameContent> {
    let dir = Path::new(content_dir);
    let constants: Constants = serde_json::from_str(
        &std::fs::read_to_string(dir.join("constants.json")).context("reading constants.json")?,
    )
    .context("parsing constants.json")?;
    let branches_file: BranchesFile = serde_json::from_str(
        &std::fs::read_to_string(dir.join("research_branches.json"))
            .context("reading research_branches.json")?,
    )
    .context("parsing research_branches.json")?;
    let content = GameContent {
        content_version: branches_file.content_version,
        branches: branches_file.branches,
        constants,
    };
    validate_content(&content);
    tracing::debug!(
        version = %content.content_version,
        branches = content.branches.len(),
        "content loaded"
    );
    Ok(content)
}

/// Founds `colony_count` colonies in the home dimension, each with one founding
/// officer, its starting researchers and an empty stash building.
pub fn build_initial_state(content: &GameContent, seed: u64, rng: &mut impl Rng) -> GameState {
    let c = &content.constants;
    let mut colonies = Vec::new();
    for n in 1..=c.colony_count {
        let uuid = colony_core::generate_uuid(rng);
        colonies.push(ColonyState {
            id: ColonyId(n),
            name: format!("Colony {n}"),
            dimension: DimensionId(HOME_DIMENSION.to_string()),
            officers: vec![ActorId(format!("actor_founder_{n}"))],
            researchers: c.researchers_per_colony,
            research: ResearchLedger::new(),
            buildings: vec![BuildingState {
                id: BuildingId(format!("building_{uuid}")),
                name: "Stash".to_string(),
                stash: Some(StashInventory::with_slots(c.stash_slots as usize)),
            }],
            pickup_queue: vec![],
        });
    }
    GameState {
        meta: MetaState {
            tick: 0,
            seed,
            schema_version: 1,
            content_version: content.content_version.clone(),
        },
        colonies,
        counters: Counters {
            next_event_id: 0,
            next_command_id: 0,
        },
    }
}

pub fn load_state(path: &str) -> Result<GameState> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading state file: {path}"))?;
    serde_json::from_str(&json).with_context(|| format!("parsing state file: {path}"))
}

/// Checks a loaded state against the content it is about to run with.
///
/// A content version mismatch only warns; the ledgers decide whether the old
/// records still fit the current research tree.
pub fn validate_state(
    state: &GameState,
    content: &GameContent,
    registry: &ResearchRegistry,
) -> Result<()> {
    if state.meta.content_version != content.content_version {
        tracing::warn!(
            saved = %state.meta.content_version,
            current = %content.content_version,
            "state was saved under different content"
        );
    }
    for colony in &state.colonies {
        colony
            .research
            .validate(registry)
            .with_context(|| format!("research ledger of colony {}", colony.id))?;
    }
    Ok(())
}

pub fn save_state(path: &str, state: &GameState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).context("serializing state")?;
    std::fs::write(path, json).with_context(|| format!("writing state file: {path}"))?;
    tracing::debug!(path, tick = state.meta.tick, "state saved");
    Ok(())
}
