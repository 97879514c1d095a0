use crate::ColonyState;

/// Decides whether a colony can turn fully-progressed research into
/// completed research this tick.
///
/// Organic and forced completion both go through this check.
pub trait CompletionGate {
    fn researcher_available(&self, colony: &ColonyState) -> bool;
}

/// Completes research as soon as progress is full.
pub struct AlwaysAvailable;

impl CompletionGate for AlwaysAvailable {
    fn researcher_available(&self, _colony: &ColonyState) -> bool {
        true
    }
}

/// Requires at least one worker assigned to the colony's university.
pub struct RequiresAssignedWorker;

impl CompletionGate for RequiresAssignedWorker {
    fn researcher_available(&self, colony: &ColonyState) -> bool {
        colony.researchers > 0
    }
}
