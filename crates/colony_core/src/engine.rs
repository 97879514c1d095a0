use rand::Rng;

use crate::gate::CompletionGate;
use crate::stash::{deposit_into_stash, fulfill_pickup, StashDeposit};
use crate::{
    BranchId, BuildingId, ColonyState, Command, CommandEnvelope, Event, EventEnvelope, EventLevel,
    GameState, ItemStack, PickupPriority, ResearchId, ResearchRegistry,
};

/// Advance the simulation by one tick.
///
/// Order of operations:
/// 1. Apply commands scheduled for this tick.
/// 2. Complete fully-progressed research in colonies whose gate is open.
/// 3. Increment tick counter.
///
/// Returns all events produced this tick.
pub fn tick(
    state: &mut GameState,
    commands: &[CommandEnvelope],
    registry: &ResearchRegistry,
    gate: &dyn CompletionGate,
    rng: &mut impl Rng,
    event_level: EventLevel,
) -> Vec<EventEnvelope> {
    let mut events = Vec::new();

    apply_commands(state, commands, registry, rng, event_level, &mut events);
    resolve_research_completions(state, registry, gate, &mut events);

    state.meta.tick += 1;
    events
}

fn apply_commands(
    state: &mut GameState,
    commands: &[CommandEnvelope],
    registry: &ResearchRegistry,
    rng: &mut impl Rng,
    event_level: EventLevel,
    events: &mut Vec<EventEnvelope>,
) {
    let current_tick = state.meta.tick;
    let GameState {
        colonies, counters, ..
    } = state;

    for envelope in commands {
        if envelope.execute_at_tick != current_tick {
            continue;
        }
        let event = match &envelope.command {
            Command::BeginResearch {
                colony_id,
                research_id,
                branch,
                depth,
            } => colonies
                .iter_mut()
                .find(|c| c.id == *colony_id)
                .and_then(|colony| {
                    handle_begin(colony, envelope, registry, research_id, branch, *depth)
                }),
            Command::Contribute {
                colony_id,
                research_id,
                amount,
            } => colonies
                .iter_mut()
                .find(|c| c.id == *colony_id)
                .and_then(|colony| {
                    handle_contribute(colony, registry, research_id, *amount, event_level)
                }),
            Command::DepositIntoStash {
                colony_id,
                building_id,
                stack,
                priority,
            } => colonies
                .iter_mut()
                .find(|c| c.id == *colony_id)
                .and_then(|colony| {
                    handle_deposit(colony, building_id, stack, *priority, current_tick, rng)
                }),
            Command::FulfillPickup {
                colony_id,
                building_id,
            } => colonies
                .iter_mut()
                .find(|c| c.id == *colony_id)
                .and_then(|colony| handle_fulfill(colony, building_id)),
        };
        if let Some(event) = event {
            events.push(crate::emit(counters, current_tick, event));
        }
    }
}

fn handle_begin(
    colony: &mut ColonyState,
    envelope: &CommandEnvelope,
    registry: &ResearchRegistry,
    research_id: &ResearchId,
    branch: &BranchId,
    depth: u32,
) -> Option<Event> {
    if !colony.is_officer(&envelope.issued_by) {
        return None;
    }
    match colony
        .research
        .begin(registry, research_id.clone(), branch.clone(), depth)
    {
        Ok(_) => Some(Event::ResearchStarted {
            colony_id: colony.id,
            research_id: research_id.clone(),
            branch: branch.clone(),
            depth,
        }),
        Err(err) => {
            tracing::warn!(command = %envelope.id, error = %err, "begin research rejected");
            None
        }
    }
}

fn handle_contribute(
    colony: &mut ColonyState,
    registry: &ResearchRegistry,
    research_id: &ResearchId,
    amount: u64,
    event_level: EventLevel,
) -> Option<Event> {
    match colony.research.contribute(registry, &research_id.0, amount) {
        Ok(applied) if applied > 0 && event_level == EventLevel::Debug => {
            let progress = colony
                .research
                .find_by_id(&research_id.0)
                .map_or(0, crate::ResearchRecord::progress);
            Some(Event::ProgressContributed {
                colony_id: colony.id,
                research_id: research_id.clone(),
                applied,
                progress,
            })
        }
        Ok(_) => None,
        Err(err) => {
            tracing::error!(colony = %colony.id, research = %research_id, error = %err, "contribution hit an inconsistent research record");
            None
        }
    }
}

fn handle_deposit(
    colony: &mut ColonyState,
    building_id: &BuildingId,
    stack: &ItemStack,
    priority: PickupPriority,
    current_tick: u64,
    rng: &mut impl Rng,
) -> Option<Event> {
    match deposit_into_stash(
        colony,
        building_id,
        stack.clone(),
        priority,
        current_tick,
        rng,
    ) {
        StashDeposit::Stored(Some(request)) => Some(Event::PickupRequested {
            colony_id: colony.id,
            building_id: building_id.clone(),
            token: request.token,
            priority: request.priority,
        }),
        StashDeposit::Stored(None) => None,
        StashDeposit::Full(rejected) => {
            tracing::debug!(%building_id, item = %rejected.item, "stash full");
            None
        }
        StashDeposit::NoStash => {
            tracing::debug!(%building_id, "deposit into building without stash");
            None
        }
    }
}

fn handle_fulfill(colony: &mut ColonyState, building_id: &BuildingId) -> Option<Event> {
    let (request, items) = fulfill_pickup(colony, building_id)?;
    Some(Event::PickupFulfilled {
        colony_id: colony.id,
        building_id: building_id.clone(),
        token: request.token,
        items: items.iter().map(|stack| stack.count).sum(),
    })
}

fn resolve_research_completions(
    state: &mut GameState,
    registry: &ResearchRegistry,
    gate: &dyn CompletionGate,
    events: &mut Vec<EventEnvelope>,
) {
    let current_tick = state.meta.tick;
    let GameState {
        colonies, counters, ..
    } = state;

    for colony in colonies.iter_mut() {
        let available = gate.researcher_available(colony);
        match colony.research.resolve_completions(registry, available) {
            Ok(finished) => {
                for record in finished {
                    events.push(crate::emit(
                        counters,
                        current_tick,
                        Event::ResearchCompleted {
                            colony_id: colony.id,
                            research_id: record.id().clone(),
                        },
                    ));
                }
            }
            Err(err) => {
                tracing::error!(colony = %colony.id, error = %err, "research completion skipped: registry out of sync");
            }
        }
    }
}
