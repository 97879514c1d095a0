//! Stash containers and the pickup requests they trigger.
//!
//! Whenever a stash's contents change while it holds anything, its building
//! asks the colony for a pickup. The colony queue holds at most one request
//! per building, so a burst of changes produces a single pickup.

use rand::Rng;

use crate::{
    BuildingId, ColonyState, ItemStack, PickupPriority, PickupRequest, StashInventory,
};

impl StashInventory {
    pub fn with_slots(slots: usize) -> Self {
        Self {
            slots: vec![None; slots],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn item_count(&self) -> u32 {
        self.slots.iter().flatten().map(|stack| stack.count).sum()
    }

    /// Merges into a slot holding the same item, else the first free slot.
    /// Hands the stack back when there is no room.
    pub fn insert(&mut self, stack: ItemStack) -> Result<(), ItemStack> {
        if stack.count == 0 {
            return Ok(());
        }
        if let Some(existing) = self
            .slots
            .iter_mut()
            .flatten()
            .find(|existing| existing.item == stack.item)
        {
            existing.count = existing.count.saturating_add(stack.count);
            return Ok(());
        }
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(stack);
                Ok(())
            }
            None => Err(stack),
        }
    }

    pub fn take_all(&mut self) -> Vec<ItemStack> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}

/// Outcome of putting items into a stash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StashDeposit {
    /// Stored; carries the pickup request it queued, if any.
    Stored(Option<PickupRequest>),
    /// The stash had no room.
    Full(ItemStack),
    /// The building is unknown or has no stash.
    NoStash,
}

impl ColonyState {
    /// Queues a pickup for `building` unless one is already pending.
    pub fn create_pickup_request(
        &mut self,
        building: &BuildingId,
        priority: PickupPriority,
        tick: u64,
        rng: &mut impl Rng,
    ) -> Option<PickupRequest> {
        if self.pending_pickup(building).is_some() {
            tracing::trace!(colony = %self.id, %building, "pickup already pending");
            return None;
        }
        let request = PickupRequest {
            token: crate::id::request_token(rng),
            building: building.clone(),
            priority,
            requested_tick: tick,
        };
        tracing::debug!(colony = %self.id, %building, token = %request.token, "pickup requested");
        self.pickup_queue.push(request.clone());
        Some(request)
    }
}

/// Content-change hook for a building's stash.
///
/// Only non-empty stashes in known buildings ask for a pickup.
pub fn on_stash_contents_changed(
    colony: &mut ColonyState,
    building: &BuildingId,
    priority: PickupPriority,
    tick: u64,
    rng: &mut impl Rng,
) -> Option<PickupRequest> {
    let holds_items = colony
        .building(building)
        .and_then(|b| b.stash.as_ref())
        .is_some_and(|stash| !stash.is_empty());
    if !holds_items {
        return None;
    }
    colony.create_pickup_request(building, priority, tick, rng)
}

pub fn deposit_into_stash(
    colony: &mut ColonyState,
    building: &BuildingId,
    stack: ItemStack,
    priority: PickupPriority,
    tick: u64,
    rng: &mut impl Rng,
) -> StashDeposit {
    let Some(stash) = colony
        .building_mut(building)
        .and_then(|b| b.stash.as_mut())
    else {
        return StashDeposit::NoStash;
    };
    if let Err(rejected) = stash.insert(stack) {
        return StashDeposit::Full(rejected);
    }
    StashDeposit::Stored(on_stash_contents_changed(
        colony, building, priority, tick, rng,
    ))
}

/// Completes the building's pending pickup, draining its stash.
///
/// Returns `None` when nothing was pending.
pub fn fulfill_pickup(
    colony: &mut ColonyState,
    building: &BuildingId,
) -> Option<(PickupRequest, Vec<ItemStack>)> {
    let idx = colony
        .pickup_queue
        .iter()
        .position(|request| request.building == *building)?;
    let request = colony.pickup_queue.remove(idx);
    let items = colony
        .building_mut(building)
        .and_then(|b| b.stash.as_mut())
        .map(StashInventory::take_all)
        .unwrap_or_default();
    Some((request, items))
}
