use super::*;
use crate::admin::{
    AdminRequest, Invoker, ListReport, MessageLog, NoRefund, OperatorList, PrivilegeCheck,
    RefundHandler, RefundOutcome, ResearchAdmin,
};
use crate::test_fixtures::{base_content, base_registry, base_state, make_rng, MAYOR, OVERWORLD};


// --- Shared test helpers ------------------------------------------------

const OPERATOR: &str = "actor_operator";

fn test_state() -> GameState {
    base_state(&base_content())
}

fn operators() -> OperatorList {
    OperatorList([ActorId::from(OPERATOR)].into_iter().collect())
}

fn invoker(actor: &str) -> Invoker {
    Invoker {
        actor: ActorId::from(actor),
        dimension: DimensionId::from(OVERWORLD),
    }
}

fn colony_one(state: &GameState) -> &ColonyState {
    state.colony(ColonyId(1)).unwrap()
}

/// Starts research in colony 1 and applies `progress` units.
fn start_research(
    state: &mut GameState,
    registry: &ResearchRegistry,
    id: &str,
    branch: &str,
    depth: u32,
    progress: u64,
) {
    let ledger = &mut state.colony_mut(ColonyId(1)).unwrap().research;
    ledger
        .begin(registry, ResearchId::from(id), BranchId::from(branch), depth)
        .unwrap();
    ledger.contribute(registry, id, progress).unwrap();
}

fn command(state: &GameState, issued_by: &str, command: Command) -> CommandEnvelope {
    CommandEnvelope {
        id: CommandId(format!("cmd_{:06}", state.meta.tick)),
        issued_by: ActorId::from(issued_by),
        issued_tick: state.meta.tick,
        execute_at_tick: state.meta.tick,
        command,
    }
}

/// Refund handler that always fails and counts its calls.
#[derive(Default)]
struct FailingRefund {
    calls: u32,
}

impl RefundHandler for FailingRefund {
    fn attempt_reset_research(
        &mut self,
        _actor: &ActorId,
        _colony: &ColonyState,
        _record: &ResearchRecord,
    ) -> RefundOutcome {
        self.calls += 1;
        RefundOutcome::Failed("university storage is full".to_string())
    }
}
