//! `colony_core`: per-colony research tracking on a deterministic tick.
//!
//! No IO, no network. All randomness via the passed-in Rng.

pub mod admin;
mod engine;
mod error;
pub mod estimate;
pub mod gate;
mod id;
mod ledger;
mod registry;
pub mod stash;
#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;
mod types;

pub use engine::tick;
pub use error::{AdminError, RegistryError, ResearchError};
pub use estimate::{estimate_remaining, quantize_remaining, TimeRemaining};
pub use gate::{AlwaysAvailable, CompletionGate, RequiresAssignedWorker};
pub use id::generate_uuid;
pub use ledger::{ResearchLedger, ResearchRecord};
pub use registry::{BranchData, ResearchRegistry};
pub use types::*;

pub(crate) fn emit(counters: &mut Counters, tick: u64, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    counters.next_event_id += 1;
    EventEnvelope { id, tick, event }
}

#[cfg(test)]
mod tests;
