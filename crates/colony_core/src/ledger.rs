//! Per-colony research ledger.
//!
//! A ledger owns the colony's in-progress research records, in the order they
//! were started, plus the ids of everything it has finished. Progress is kept
//! within `0..=base_time(branch, depth)` at all times; every mutation that
//! needs the cost consults the shared `ResearchRegistry`.
//!
//! Lookups by id scan newest-first and resolve to a position before anything
//! is mutated, so a removal never happens mid-iteration.

use serde::{Deserialize, Serialize};

use crate::{BranchId, RegistryError, ResearchError, ResearchId, ResearchRegistry};

/// One colony's progress on a single branch/depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRecord {
    id: ResearchId,
    branch: BranchId,
    depth: u32,
    progress: u64,
}

impl ResearchRecord {
    pub fn id(&self) -> &ResearchId {
        &self.id
    }

    pub fn branch(&self) -> &BranchId {
        &self.branch
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn progress(&self) -> u64 {
        self.progress
    }

    pub fn cost(&self, registry: &ResearchRegistry) -> Result<u64, RegistryError> {
        registry.base_time(&self.branch, self.depth)
    }

    pub fn remaining(&self, registry: &ResearchRegistry) -> Result<u64, RegistryError> {
        Ok(self.cost(registry)?.saturating_sub(self.progress))
    }

    /// Progress has reached the cost; completion still waits on a researcher.
    pub fn is_progress_complete(&self, registry: &ResearchRegistry) -> Result<bool, RegistryError> {
        Ok(self.progress >= self.cost(registry)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchLedger {
    in_progress: Vec<ResearchRecord>,
    completed: Vec<ResearchId>,
}

impl ResearchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether `begin` would accept this research, without starting it.
    pub fn can_begin(
        &self,
        registry: &ResearchRegistry,
        id: &ResearchId,
        branch: &BranchId,
        depth: u32,
    ) -> Result<(), ResearchError> {
        registry.base_time(branch, depth)?;

        if self.is_completed(id) {
            return Err(ResearchError::AlreadyCompleted(id.clone()));
        }
        if self.in_progress.iter().any(|record| record.id == *id) {
            return Err(ResearchError::AlreadyInProgress(id.clone()));
        }
        if let Some(existing) = self
            .in_progress
            .iter()
            .find(|record| record.branch == *branch && record.depth == depth)
        {
            return Err(ResearchError::DepthInProgress {
                branch: branch.clone(),
                depth,
                existing: existing.id.clone(),
            });
        }
        Ok(())
    }

    /// Starts research on `branch` at `depth` with zero progress.
    pub fn begin(
        &mut self,
        registry: &ResearchRegistry,
        id: ResearchId,
        branch: BranchId,
        depth: u32,
    ) -> Result<&ResearchRecord, ResearchError> {
        self.can_begin(registry, &id, &branch, depth)?;

        tracing::debug!(research = %id, %branch, depth, "research started");
        self.in_progress.push(ResearchRecord {
            id,
            branch,
            depth,
            progress: 0,
        });
        Ok(&self.in_progress[self.in_progress.len() - 1])
    }

    /// Re-checks every record against `registry`, e.g. after loading a saved
    /// ledger that may predate the current content.
    ///
    /// Fails on the first record whose branch/depth is unknown, whose progress
    /// exceeds its cost, or that duplicates an earlier id or branch+depth.
    pub fn validate(&self, registry: &ResearchRegistry) -> Result<(), ResearchError> {
        for (idx, record) in self.in_progress.iter().enumerate() {
            let cost = record.cost(registry)?;
            if record.progress > cost {
                return Err(ResearchError::ProgressExceedsCost {
                    id: record.id.clone(),
                    progress: record.progress,
                    cost,
                });
            }
            if self.is_completed(&record.id) {
                return Err(ResearchError::AlreadyCompleted(record.id.clone()));
            }
            for earlier in &self.in_progress[..idx] {
                if earlier.id == record.id {
                    return Err(ResearchError::AlreadyInProgress(record.id.clone()));
                }
                if earlier.branch == record.branch && earlier.depth == record.depth {
                    return Err(ResearchError::DepthInProgress {
                        branch: record.branch.clone(),
                        depth: record.depth,
                        existing: earlier.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Insertion-ordered view of the records still in progress.
    pub fn in_progress(&self) -> &[ResearchRecord] {
        &self.in_progress
    }

    pub fn is_empty(&self) -> bool {
        self.in_progress.is_empty()
    }

    pub fn len(&self) -> usize {
        self.in_progress.len()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&ResearchRecord> {
        self.position(id).map(|idx| &self.in_progress[idx])
    }

    /// Adds `amount` to a record's progress, clamped at its cost.
    ///
    /// Returns the amount actually applied. Unknown ids are a no-op: the
    /// record may have completed or been cancelled since the contribution was
    /// scheduled.
    pub fn contribute(
        &mut self,
        registry: &ResearchRegistry,
        id: &str,
        amount: u64,
    ) -> Result<u64, ResearchError> {
        let Some(idx) = self.position(id) else {
            return Ok(0);
        };
        let record = &mut self.in_progress[idx];
        let cost = record.cost(registry)?;
        let before = record.progress;
        record.progress = record.progress.saturating_add(amount).min(cost);
        Ok(record.progress.saturating_sub(before))
    }

    /// Sets progress straight to the cost. The record stays in progress until
    /// `resolve_completions` sees an available researcher.
    pub fn force_complete(
        &mut self,
        registry: &ResearchRegistry,
        id: &str,
    ) -> Result<&ResearchRecord, ResearchError> {
        let idx = self
            .position(id)
            .ok_or_else(|| ResearchError::NotFound(ResearchId::from(id)))?;
        let record = &mut self.in_progress[idx];
        record.progress = record.cost(registry)?;
        Ok(record)
    }

    /// Removes the record so no further progress can reach it.
    pub fn cancel(&mut self, id: &str) -> Result<ResearchRecord, ResearchError> {
        let idx = self
            .position(id)
            .ok_or_else(|| ResearchError::NotFound(ResearchId::from(id)))?;
        let record = self.in_progress.remove(idx);
        tracing::debug!(research = %record.id, "research cancelled");
        Ok(record)
    }

    /// Moves every fully-progressed record to the completed list, provided a
    /// researcher is available. Returns the finished records in start order.
    pub fn resolve_completions(
        &mut self,
        registry: &ResearchRegistry,
        researcher_available: bool,
    ) -> Result<Vec<ResearchRecord>, ResearchError> {
        if !researcher_available {
            return Ok(Vec::new());
        }

        let mut ready = Vec::new();
        for (idx, record) in self.in_progress.iter().enumerate() {
            if record.is_progress_complete(registry)? {
                ready.push(idx);
            }
        }

        let mut finished: Vec<ResearchRecord> = ready
            .into_iter()
            .rev()
            .map(|idx| self.in_progress.remove(idx))
            .collect();
        finished.reverse();

        for record in &finished {
            tracing::debug!(research = %record.id, "research completed");
            self.completed.push(record.id.clone());
        }
        Ok(finished)
    }

    /// Ids of finished research, in completion order.
    pub fn completed(&self) -> &[ResearchId] {
        &self.completed
    }

    pub fn is_completed(&self, id: &ResearchId) -> bool {
        self.completed.contains(id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.in_progress.iter().rposition(|record| record.id.0 == id)
    }
}
