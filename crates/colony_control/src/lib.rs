use colony_core::{
    ActorId, Command, CommandEnvelope, CommandId, GameContent, GameState, PickupPriority,
};
use serde::{Deserialize, Serialize};

pub trait CommandSource {
    fn generate_commands(
        &mut self,
        state: &GameState,
        content: &GameContent,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope>;
}

/// Puts each colony's researchers to work.
///
/// Every researcher takes one in-progress record, oldest first, and produces
/// `progress_per_researcher_per_tick` for it. Colonies without an officer are
/// skipped since nobody can issue on their behalf.
pub struct UniversityController;

/// Collects stash pickups once they have waited `courier_delay_ticks`.
/// Player-triggered requests are served before automatic ones.
pub struct CourierController;

const COURIER_OWNER: &str = "actor_courier";

/// Runs several sources in order and concatenates their commands.
#[derive(Default)]
pub struct ControllerSet {
    sources: Vec<Box<dyn CommandSource>>,
}

impl ControllerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// University then courier, the default colony workforce.
    pub fn standard() -> Self {
        Self::new()
            .with(UniversityController)
            .with(CourierController)
    }

    #[must_use]
    pub fn with(mut self, source: impl CommandSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl CommandSource for ControllerSet {
    fn generate_commands(
        &mut self,
        state: &GameState,
        content: &GameContent,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope> {
        self.sources
            .iter_mut()
            .flat_map(|source| source.generate_commands(state, content, next_command_id))
            .collect()
    }
}

/// Per-colony summary of what the controllers would do this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSummary {
    pub colony_id: u32,
    pub busy_researchers: u32,
    pub idle_researchers: u32,
    pub pending_pickups: usize,
}

pub fn workload(state: &GameState) -> Vec<WorkloadSummary> {
    state
        .colonies
        .iter()
        .map(|colony| {
            let open = u32::try_from(colony.research.len()).unwrap_or(u32::MAX);
            let busy = colony.researchers.min(open);
            WorkloadSummary {
                colony_id: colony.id.0,
                busy_researchers: busy,
                idle_researchers: colony.researchers - busy,
                pending_pickups: colony.pickup_queue.len(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Allocates a command ID and builds a `CommandEnvelope`.
fn make_cmd(owner: &ActorId, tick: u64, next_id: &mut u64, command: Command) -> CommandEnvelope {
    let cmd_id = CommandId(format!("cmd_{:06}", *next_id));
    *next_id += 1;
    CommandEnvelope {
        id: cmd_id,
        issued_by: owner.clone(),
        issued_tick: tick,
        execute_at_tick: tick,
        command,
    }
}

impl CommandSource for UniversityController {
    fn generate_commands(
        &mut self,
        state: &GameState,
        content: &GameContent,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope> {
        let mut commands = Vec::new();
        let amount = content.constants.progress_per_researcher_per_tick;
        if amount == 0 {
            return commands;
        }

        for colony in &state.colonies {
            let Some(owner) = colony.officers.first() else {
                continue;
            };
            for record in colony
                .research
                .in_progress()
                .iter()
                .take(colony.researchers as usize)
            {
                commands.push(make_cmd(
                    owner,
                    state.meta.tick,
                    next_command_id,
                    Command::Contribute {
                        colony_id: colony.id,
                        research_id: record.id().clone(),
                        amount,
                    },
                ));
            }
        }
        commands
    }
}

impl CommandSource for CourierController {
    fn generate_commands(
        &mut self,
        state: &GameState,
        content: &GameContent,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope> {
        let owner = ActorId(COURIER_OWNER.to_string());
        let now = state.meta.tick;
        let mut commands = Vec::new();

        for colony in &state.colonies {
            let mut due: Vec<_> = colony
                .pickup_queue
                .iter()
                .filter(|request| {
                    request.priority == PickupPriority::PlayerAction
                        || now.saturating_sub(request.requested_tick)
                            >= content.constants.courier_delay_ticks
                })
                .collect();
            due.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then(a.requested_tick.cmp(&b.requested_tick))
                    .then_with(|| a.building.cmp(&b.building))
            });
            for request in due {
                commands.push(make_cmd(
                    &owner,
                    now,
                    next_command_id,
                    Command::FulfillPickup {
                        colony_id: colony.id,
                        building_id: request.building.clone(),
                    },
                ));
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_core::test_fixtures::{
        base_content, base_registry, base_state, make_rng, MAYOR, STASH_BUILDING,
    };
    use colony_core::{BranchId, BuildingId, ColonyId, ResearchId};

    fn with_research(ids: &[(&str, &str, u32)]) -> (GameContent, GameState) {
        let content = base_content();
        let registry = base_registry();
        let mut state = base_state(&content);
        let colony = state.colony_mut(ColonyId(1)).unwrap();
        for (id, branch, depth) in ids {
            colony
                .research
                .begin(
                    &registry,
                    ResearchId::from(*id),
                    BranchId::from(*branch),
                    *depth,
                )
                .unwrap();
        }
        (content, state)
    }

    fn contributed_ids(commands: &[CommandEnvelope]) -> Vec<&str> {
        commands
            .iter()
            .filter_map(|cmd| match &cmd.command {
                Command::Contribute { research_id, .. } => Some(research_id.0.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_university_idle_without_research() {
        let content = base_content();
        let state = base_state(&content);
        let mut next_id = 0;
        let commands = UniversityController.generate_commands(&state, &content, &mut next_id);
        assert!(commands.is_empty());
        assert_eq!(next_id, 0);
    }

    #[test]
    fn test_university_single_researcher_works_oldest_record() {
        let (content, state) = with_research(&[
            ("technology/woodwork", "technology", 0),
            ("civilian/housing", "civilian", 0),
        ]);
        let mut next_id = 0;
        let commands = UniversityController.generate_commands(&state, &content, &mut next_id);

        assert_eq!(contributed_ids(&commands), ["technology/woodwork"]);
        assert_eq!(commands[0].issued_by, ActorId::from(MAYOR));
        assert_eq!(commands[0].id, CommandId("cmd_000000".to_string()));
        assert!(matches!(
            commands[0].command,
            Command::Contribute { amount: 10, .. }
        ));
    }

    #[test]
    fn test_university_spreads_researchers_across_records() {
        let (content, mut state) = with_research(&[
            ("technology/woodwork", "technology", 0),
            ("civilian/housing", "civilian", 0),
            ("combat/drill", "combat", 0),
        ]);
        state.colony_mut(ColonyId(1)).unwrap().researchers = 2;
        let mut next_id = 7;
        let commands = UniversityController.generate_commands(&state, &content, &mut next_id);

        assert_eq!(
            contributed_ids(&commands),
            ["technology/woodwork", "civilian/housing"]
        );
        assert_eq!(next_id, 9);
    }

    #[test]
    fn test_university_skips_colony_without_officers() {
        let (content, mut state) = with_research(&[("combat/drill", "combat", 0)]);
        state.colony_mut(ColonyId(1)).unwrap().officers.clear();
        let mut next_id = 0;
        let commands = UniversityController.generate_commands(&state, &content, &mut next_id);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_courier_waits_for_delay_on_automatic_requests() {
        let content = base_content();
        let mut state = base_state(&content);
        let mut rng = make_rng();
        let building = BuildingId::from(STASH_BUILDING);
        stash_helpers::deposit(
            state.colony_mut(ColonyId(1)).unwrap(),
            &building,
            PickupPriority::Automatic,
            &mut rng,
        );

        let mut next_id = 0;
        state.meta.tick = 1;
        assert!(CourierController
            .generate_commands(&state, &content, &mut next_id)
            .is_empty());

        state.meta.tick = content.constants.courier_delay_ticks;
        let commands = CourierController.generate_commands(&state, &content, &mut next_id);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].issued_by, ActorId::from(COURIER_OWNER));
        assert!(matches!(
            &commands[0].command,
            Command::FulfillPickup { building_id, .. } if *building_id == building
        ));
    }

    #[test]
    fn test_courier_serves_player_requests_immediately() {
        let content = base_content();
        let mut state = base_state(&content);
        let mut rng = make_rng();
        let building = BuildingId::from(STASH_BUILDING);
        stash_helpers::deposit(
            state.colony_mut(ColonyId(1)).unwrap(),
            &building,
            PickupPriority::PlayerAction,
            &mut rng,
        );

        let mut next_id = 0;
        let commands = CourierController.generate_commands(&state, &content, &mut next_id);
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_controller_set_chains_sources_with_shared_ids() {
        let (content, mut state) = with_research(&[("combat/drill", "combat", 0)]);
        let mut rng = make_rng();
        stash_helpers::deposit(
            state.colony_mut(ColonyId(1)).unwrap(),
            &BuildingId::from(STASH_BUILDING),
            PickupPriority::PlayerAction,
            &mut rng,
        );

        let mut next_id = 0;
        let commands = ControllerSet::standard().generate_commands(&state, &content, &mut next_id);
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0].command, Command::Contribute { .. }));
        assert!(matches!(commands[1].command, Command::FulfillPickup { .. }));
        assert_eq!(commands[1].id, CommandId("cmd_000001".to_string()));
    }

    #[test]
    fn test_workload_reports_idle_researchers() {
        let (_, mut state) = with_research(&[("combat/drill", "combat", 0)]);
        state.colony_mut(ColonyId(1)).unwrap().researchers = 3;
        let summary = workload(&state);
        assert_eq!(
            summary[0],
            WorkloadSummary {
                colony_id: 1,
                busy_researchers: 1,
                idle_researchers: 2,
                pending_pickups: 0,
            }
        );
    }

    mod stash_helpers {
        use colony_core::stash::{deposit_into_stash, StashDeposit};
        use colony_core::{BuildingId, ColonyState, ItemStack, PickupPriority};
        use rand_chacha::ChaCha8Rng;

        pub(super) fn deposit(
            colony: &mut ColonyState,
            building: &BuildingId,
            priority: PickupPriority,
            rng: &mut ChaCha8Rng,
        ) {
            let stored = deposit_into_stash(
                colony,
                building,
                ItemStack {
                    item: "oak_log".to_string(),
                    count: 16,
                },
                priority,
                0,
                rng,
            );
            assert!(matches!(stored, StashDeposit::Stored(Some(_))));
        }
    }
}
