//! Type definitions for `colony_core`.
//!
//! State, content, command and event types shared by the simulation, plus the
//! ID newtypes they are keyed by.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::ledger::ResearchLedger;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(BranchId);
string_id!(ResearchId);
string_id!(ActorId);
string_id!(DimensionId);
string_id!(BuildingId);
string_id!(CommandId);
string_id!(EventId);

/// Colony identifiers are small positive integers, as typed by operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColonyId(pub u32);

impl std::fmt::Display for ColonyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one queued pickup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestToken(pub Uuid);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventLevel {
    Normal,
    Debug,
}

/// Urgency of a pickup request. Player actions outrank background triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PickupPriority {
    Automatic,
    PlayerAction,
}

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub meta: MetaState,
    /// Sorted by colony id.
    pub colonies: Vec<ColonyState>,
    pub counters: Counters,
}

impl GameState {
    /// Looks a colony up by id within the given dimension.
    pub fn resolve_colony(&self, id: ColonyId, dimension: &DimensionId) -> Option<&ColonyState> {
        self.colonies
            .iter()
            .find(|colony| colony.id == id && colony.dimension == *dimension)
    }

    pub fn colony(&self, id: ColonyId) -> Option<&ColonyState> {
        self.colonies.iter().find(|colony| colony.id == id)
    }

    pub fn colony_mut(&mut self, id: ColonyId) -> Option<&mut ColonyState> {
        self.colonies.iter_mut().find(|colony| colony.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaState {
    pub tick: u64,
    pub seed: u64,
    pub schema_version: u32,
    pub content_version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
    pub next_command_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonyState {
    pub id: ColonyId,
    pub name: String,
    pub dimension: DimensionId,
    pub officers: Vec<ActorId>,
    /// Workers assigned to the colony's university.
    pub researchers: u32,
    pub research: ResearchLedger,
    pub buildings: Vec<BuildingState>,
    /// Outstanding pickup requests, at most one per building.
    pub pickup_queue: Vec<PickupRequest>,
}

impl ColonyState {
    pub fn is_officer(&self, actor: &ActorId) -> bool {
        self.officers.contains(actor)
    }

    pub fn building(&self, id: &BuildingId) -> Option<&BuildingState> {
        self.buildings.iter().find(|building| building.id == *id)
    }

    pub fn building_mut(&mut self, id: &BuildingId) -> Option<&mut BuildingState> {
        self.buildings.iter_mut().find(|building| building.id == *id)
    }

    pub fn pending_pickup(&self, building: &BuildingId) -> Option<&PickupRequest> {
        self.pickup_queue
            .iter()
            .find(|request| request.building == *building)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingState {
    pub id: BuildingId,
    pub name: String,
    /// Present only for buildings with a stash container.
    pub stash: Option<StashInventory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashInventory {
    pub slots: Vec<Option<ItemStack>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupRequest {
    pub token: RequestToken,
    pub building: BuildingId,
    pub priority: PickupPriority,
    pub requested_tick: u64,
}

// ---------------------------------------------------------------------------
// Command types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub id: CommandId,
    pub issued_by: ActorId,
    pub issued_tick: u64,
    pub execute_at_tick: u64,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    BeginResearch {
        colony_id: ColonyId,
        research_id: ResearchId,
        branch: BranchId,
        depth: u32,
    },
    /// Progress produced by the colony's researchers.
    Contribute {
        colony_id: ColonyId,
        research_id: ResearchId,
        amount: u64,
    },
    DepositIntoStash {
        colony_id: ColonyId,
        building_id: BuildingId,
        stack: ItemStack,
        priority: PickupPriority,
    },
    FulfillPickup {
        colony_id: ColonyId,
        building_id: BuildingId,
    },
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub tick: u64,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ResearchStarted {
        colony_id: ColonyId,
        research_id: ResearchId,
        branch: BranchId,
        depth: u32,
    },
    /// Only emitted at `EventLevel::Debug`.
    ProgressContributed {
        colony_id: ColonyId,
        research_id: ResearchId,
        applied: u64,
        progress: u64,
    },
    ResearchForceCompleted {
        colony_id: ColonyId,
        research_id: ResearchId,
        actor: ActorId,
    },
    ResearchCompleted {
        colony_id: ColonyId,
        research_id: ResearchId,
    },
    ResearchCancelled {
        colony_id: ColonyId,
        research_id: ResearchId,
        actor: ActorId,
        refunded: bool,
    },
    PickupRequested {
        colony_id: ColonyId,
        building_id: BuildingId,
        token: RequestToken,
        priority: PickupPriority,
    },
    PickupFulfilled {
        colony_id: ColonyId,
        building_id: BuildingId,
        token: RequestToken,
        items: u32,
    },
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameContent {
    pub content_version: String,
    pub branches: Vec<BranchDef>,
    pub constants: Constants,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchDef {
    pub id: BranchId,
    pub name: String,
    /// Base research time per depth; index is the depth.
    pub base_times: SmallVec<[u64; 8]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constants {
    /// Progress units counted as `H` by the remaining-time estimate.
    pub base_research_time: u64,
    pub progress_per_researcher_per_tick: u64,
    pub colony_count: u32,
    pub researchers_per_colony: u32,
    pub stash_slots: u32,
    /// Ticks a pickup waits in the queue before a courier collects it.
    pub courier_delay_ticks: u64,
}
