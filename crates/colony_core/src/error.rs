use thiserror::Error;

use crate::{BranchId, ColonyId, ResearchId};

/// Failures of the research definition registry.
///
/// Outside of content loading these mean a record and the registry disagree,
/// which is a defect rather than bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown research branch '{0}'")]
    UnknownBranch(BranchId),

    #[error("depth {depth} is out of range for branch '{branch}' (deepest is {max_depth})")]
    InvalidDepth {
        branch: BranchId,
        depth: u32,
        max_depth: u32,
    },

    #[error("research branch '{0}' is defined more than once")]
    DuplicateBranch(BranchId),

    #[error("research branch '{0}' has no depth levels")]
    EmptyBranch(BranchId),

    #[error("research branch '{branch}' depth {depth} has a zero base time")]
    NonPositiveBaseTime { branch: BranchId, depth: u32 },

    #[error("base research time must be positive")]
    ZeroBaseResearchTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResearchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("no in-progress research with id '{0}'")]
    NotFound(ResearchId),

    #[error("research '{0}' is already in progress")]
    AlreadyInProgress(ResearchId),

    #[error("branch '{branch}' depth {depth} is already being researched as '{existing}'")]
    DepthInProgress {
        branch: BranchId,
        depth: u32,
        existing: ResearchId,
    },

    #[error("research '{0}' has already been completed")]
    AlreadyCompleted(ResearchId),

    #[error("research '{id}' has progress {progress} beyond its cost {cost}")]
    ProgressExceedsCost {
        id: ResearchId,
        progress: u64,
        cost: u64,
    },
}

impl ResearchError {
    /// True when the error reflects registry/record desynchronization.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Registry(_))
    }
}

/// Errors returned by the operator research commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("Colony with ID {0} not found.")]
    ColonyNotFound(ColonyId),

    #[error("This command requires operator privileges.")]
    PermissionDenied,

    #[error("Failed to find in-progress research with the ID: <NULL>!")]
    MissingIdentifier,

    #[error("Failed to find in-progress research with the ID: <{0}>!")]
    ResearchNotFound(String),

    #[error("internal research error: {0}")]
    Internal(#[from] ResearchError),
}
