//! Shared test fixtures for colony_core and downstream crates.
//!
//! `base_content()` provides a small three-branch research tree with `H = 60`.
//! `base_state()` builds one colony in the overworld with a mayor, a single
//! researcher and a stash building, plus a second colony in another dimension.

use crate::{
    ActorId, BranchDef, BranchId, BuildingId, BuildingState, ColonyId, ColonyState, Constants,
    Counters, DimensionId, GameContent, GameState, MetaState, ResearchLedger, ResearchRegistry,
    StashInventory,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use smallvec::smallvec;

pub const MAYOR: &str = "actor_mayor";
pub const OVERWORLD: &str = "overworld";
pub const STASH_BUILDING: &str = "building_stash_0001";

/// technology: 120/240/480, civilian: 60/180, combat: 90. `H = 60`.
pub fn base_content() -> GameContent {
    GameContent {
        content_version: "test".to_string(),
        branches: vec![
            BranchDef {
                id: BranchId::from("technology"),
                name: "Technology".to_string(),
                base_times: smallvec![120, 240, 480],
            },
            BranchDef {
                id: BranchId::from("civilian"),
                name: "Civilian".to_string(),
                base_times: smallvec![60, 180],
            },
            BranchDef {
                id: BranchId::from("combat"),
                name: "Combat".to_string(),
                base_times: smallvec![90],
            },
        ],
        constants: Constants {
            base_research_time: 60,
            progress_per_researcher_per_tick: 10,
            colony_count: 1,
            researchers_per_colony: 1,
            stash_slots: 4,
            courier_delay_ticks: 2,
        },
    }
}

pub fn base_registry() -> ResearchRegistry {
    ResearchRegistry::from_content(&base_content()).expect("fixture content is valid")
}

pub fn colony(id: u32, dimension: &str, content: &GameContent) -> ColonyState {
    ColonyState {
        id: ColonyId(id),
        name: format!("Colony {id}"),
        dimension: DimensionId::from(dimension),
        officers: vec![ActorId::from(MAYOR)],
        researchers: 1,
        research: ResearchLedger::new(),
        buildings: vec![BuildingState {
            id: BuildingId::from(STASH_BUILDING),
            name: "Stash".to_string(),
            stash: Some(StashInventory::with_slots(
                content.constants.stash_slots as usize,
            )),
        }],
        pickup_queue: vec![],
    }
}

/// Colony 1 in the overworld, colony 2 in the nether.
pub fn base_state(content: &GameContent) -> GameState {
    GameState {
        meta: MetaState {
            tick: 0,
            seed: 42,
            schema_version: 1,
            content_version: content.content_version.clone(),
        },
        colonies: vec![colony(1, OVERWORLD, content), colony(2, "nether", content)],
        counters: Counters::default(),
    }
}

/// Deterministic RNG seeded with 42.
pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}
