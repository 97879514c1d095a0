use ahash::AHashMap;
use smallvec::SmallVec;

use crate::{BranchDef, BranchId, GameContent, RegistryError};

/// One research branch: its display name and the base time of every depth.
#[derive(Debug, Clone)]
pub struct BranchData {
    id: BranchId,
    name: String,
    base_times: SmallVec<[u64; 8]>,
}

impl BranchData {
    pub fn id(&self) -> &BranchId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base research time at `depth`.
    pub fn base_time(&self, depth: u32) -> Result<u64, RegistryError> {
        usize::try_from(depth)
            .ok()
            .and_then(|idx| self.base_times.get(idx))
            .copied()
            .ok_or_else(|| RegistryError::InvalidDepth {
                branch: self.id.clone(),
                depth,
                max_depth: self.max_depth(),
            })
    }

    /// Deepest valid depth. Depths run contiguously from 0.
    #[allow(clippy::cast_possible_truncation)]
    pub fn max_depth(&self) -> u32 {
        self.base_times.len().saturating_sub(1) as u32
    }

    /// `(depth, base_time)` pairs in depth order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn depths(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.base_times
            .iter()
            .enumerate()
            .map(|(depth, time)| (depth as u32, *time))
    }
}

/// The research tree shared by every colony.
///
/// Built once from content and never mutated afterwards; colonies and the
/// estimator borrow it.
#[derive(Debug, Clone)]
pub struct ResearchRegistry {
    branches: AHashMap<BranchId, BranchData>,
    base_research_time: u64,
}

impl ResearchRegistry {
    pub fn from_content(content: &GameContent) -> Result<Self, RegistryError> {
        Self::new(
            content.branches.iter().cloned(),
            content.constants.base_research_time,
        )
    }

    pub fn new(
        branches: impl IntoIterator<Item = BranchDef>,
        base_research_time: u64,
    ) -> Result<Self, RegistryError> {
        if base_research_time == 0 {
            return Err(RegistryError::ZeroBaseResearchTime);
        }

        let mut map = AHashMap::new();
        for def in branches {
            if def.base_times.is_empty() {
                return Err(RegistryError::EmptyBranch(def.id));
            }
            if let Some(depth) = def.base_times.iter().position(|time| *time == 0) {
                return Err(RegistryError::NonPositiveBaseTime {
                    branch: def.id,
                    depth: u32::try_from(depth).unwrap_or(u32::MAX),
                });
            }
            if map.contains_key(&def.id) {
                return Err(RegistryError::DuplicateBranch(def.id));
            }
            map.insert(
                def.id.clone(),
                BranchData {
                    id: def.id,
                    name: def.name,
                    base_times: def.base_times,
                },
            );
        }

        Ok(Self {
            branches: map,
            base_research_time,
        })
    }

    pub fn branch(&self, id: &BranchId) -> Option<&BranchData> {
        self.branches.get(id)
    }

    pub fn base_time(&self, branch: &BranchId, depth: u32) -> Result<u64, RegistryError> {
        self.branch(branch)
            .ok_or_else(|| RegistryError::UnknownBranch(branch.clone()))?
            .base_time(depth)
    }

    /// The `H` constant of the remaining-time estimate.
    pub fn base_research_time(&self) -> u64 {
        self.base_research_time
    }

    /// Branch ids sorted for determinism.
    pub fn branch_ids(&self) -> Vec<&BranchId> {
        let mut ids: Vec<&BranchId> = self.branches.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}
