//! Operator research commands: `list`, `complete` and `cancel`.
//!
//! Every command resolves the colony in the invoker's dimension and checks
//! that the invoker is one of its officers (or holds operator privileges).
//! `complete` additionally requires operator privileges. User mistakes come
//! back as `AdminError`s; `execute` turns them into a message for the invoker
//! and a failed outcome.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::estimate::{estimate_remaining, TimeRemaining};
use crate::ledger::ResearchRecord;
use crate::{
    ActorId, AdminError, ColonyId, ColonyState, Counters, DimensionId, Event, EventEnvelope,
    GameState, ResearchId, ResearchRegistry,
};

const RESEARCH_COMPLETED: &str = "Research progress set to max. Awaiting researcher for completion.";
const RESEARCH_IN_PROGRESS_EMPTY: &str = "There is no research in-progress for this colony.";

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

pub trait PrivilegeCheck {
    fn has_elevated_privilege(&self, actor: &ActorId) -> bool;
}

pub trait MessageSink {
    fn deliver(&mut self, actor: &ActorId, message: String);
}

/// Returns whatever a cancelled research had consumed.
pub trait RefundHandler {
    fn attempt_reset_research(
        &mut self,
        actor: &ActorId,
        colony: &ColonyState,
        record: &ResearchRecord,
    ) -> RefundOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundOutcome {
    Refunded,
    NothingToRefund,
    Failed(String),
}

/// Fixed set of operator actors.
#[derive(Debug, Clone, Default)]
pub struct OperatorList(pub HashSet<ActorId>);

impl PrivilegeCheck for OperatorList {
    fn has_elevated_privilege(&self, actor: &ActorId) -> bool {
        self.0.contains(actor)
    }
}

/// Refund handler for worlds where research consumes nothing up front.
pub struct NoRefund;

impl RefundHandler for NoRefund {
    fn attempt_reset_research(
        &mut self,
        _actor: &ActorId,
        _colony: &ColonyState,
        _record: &ResearchRecord,
    ) -> RefundOutcome {
        RefundOutcome::NothingToRefund
    }
}

/// Collects delivered messages in order.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    pub delivered: Vec<(ActorId, String)>,
}

impl MessageSink for MessageLog {
    fn deliver(&mut self, actor: &ActorId, message: String) {
        self.delivered.push((actor.clone(), message));
    }
}

// ---------------------------------------------------------------------------
// Requests and results
// ---------------------------------------------------------------------------

/// Who is running a command, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoker {
    pub actor: ActorId,
    pub dimension: DimensionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminRequest {
    List {
        colony_id: ColonyId,
    },
    Complete {
        colony_id: ColonyId,
        research_id: String,
    },
    Cancel {
        colony_id: ColonyId,
        research_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub research_id: ResearchId,
    pub remaining: TimeRemaining,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListReport {
    NoResearchInProgress,
    InProgress(Vec<ListEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub messages: Vec<String>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct ResearchAdmin<'a> {
    registry: &'a ResearchRegistry,
    privileges: &'a dyn PrivilegeCheck,
    refunds: &'a mut dyn RefundHandler,
}

impl<'a> ResearchAdmin<'a> {
    pub fn new(
        registry: &'a ResearchRegistry,
        privileges: &'a dyn PrivilegeCheck,
        refunds: &'a mut dyn RefundHandler,
    ) -> Self {
        Self {
            registry,
            privileges,
            refunds,
        }
    }

    pub fn list(
        &self,
        state: &GameState,
        invoker: &Invoker,
        colony_id: ColonyId,
    ) -> Result<ListReport, AdminError> {
        let colony = state
            .resolve_colony(colony_id, &invoker.dimension)
            .ok_or(AdminError::ColonyNotFound(colony_id))?;
        self.authorize(colony, invoker)?;

        let records = colony.research.in_progress();
        if records.is_empty() {
            return Ok(ListReport::NoResearchInProgress);
        }
        let entries = records
            .iter()
            .map(|record| {
                Ok(ListEntry {
                    research_id: record.id().clone(),
                    remaining: estimate_remaining(self.registry, record)
                        .map_err(crate::ResearchError::from)?,
                })
            })
            .collect::<Result<Vec<_>, AdminError>>()?;
        Ok(ListReport::InProgress(entries))
    }

    /// Fills a research's progress; completion still waits for a researcher.
    pub fn complete(
        &self,
        state: &mut GameState,
        invoker: &Invoker,
        colony_id: ColonyId,
        research_id: &str,
        events: &mut Vec<EventEnvelope>,
    ) -> Result<ResearchId, AdminError> {
        let tick = state.meta.tick;
        let (colony, counters) = split_colony(state, colony_id, &invoker.dimension)?;
        self.authorize(colony, invoker)?;
        require_identifier(research_id)?;

        if colony.research.find_by_id(research_id).is_none() {
            return Err(AdminError::ResearchNotFound(research_id.to_string()));
        }
        if !self.privileges.has_elevated_privilege(&invoker.actor) {
            return Err(AdminError::PermissionDenied);
        }

        let id = colony
            .research
            .force_complete(self.registry, research_id)?
            .id()
            .clone();
        tracing::info!(colony = %colony_id, research = %id, actor = %invoker.actor, "research force-completed");
        events.push(crate::emit(
            counters,
            tick,
            Event::ResearchForceCompleted {
                colony_id,
                research_id: id.clone(),
                actor: invoker.actor.clone(),
            },
        ));
        Ok(id)
    }

    /// Removes a research from the colony, then attempts a refund. A failed
    /// refund is reported but the research stays cancelled.
    pub fn cancel(
        &mut self,
        state: &mut GameState,
        invoker: &Invoker,
        colony_id: ColonyId,
        research_id: &str,
        events: &mut Vec<EventEnvelope>,
    ) -> Result<(ResearchId, RefundOutcome), AdminError> {
        let tick = state.meta.tick;
        let (colony, counters) = split_colony(state, colony_id, &invoker.dimension)?;
        self.authorize(colony, invoker)?;
        require_identifier(research_id)?;

        let record = colony
            .research
            .cancel(research_id)
            .map_err(|_| AdminError::ResearchNotFound(research_id.to_string()))?;
        let outcome = self
            .refunds
            .attempt_reset_research(&invoker.actor, colony, &record);
        if let RefundOutcome::Failed(reason) = &outcome {
            tracing::warn!(colony = %colony_id, research = %record.id(), %reason, "refund failed for cancelled research");
        }

        events.push(crate::emit(
            counters,
            tick,
            Event::ResearchCancelled {
                colony_id,
                research_id: record.id().clone(),
                actor: invoker.actor.clone(),
                refunded: outcome == RefundOutcome::Refunded,
            },
        ));
        Ok((record.id().clone(), outcome))
    }

    /// Runs one request and delivers its messages to the invoker.
    pub fn execute(
        &mut self,
        state: &mut GameState,
        invoker: &Invoker,
        request: &AdminRequest,
        sink: &mut dyn MessageSink,
        events: &mut Vec<EventEnvelope>,
    ) -> CommandOutcome {
        let result = match request {
            AdminRequest::List { colony_id } => self
                .list(state, invoker, *colony_id)
                .map(|report| list_messages(&report)),
            AdminRequest::Complete {
                colony_id,
                research_id,
            } => self
                .complete(state, invoker, *colony_id, research_id, events)
                .map(|_| vec![RESEARCH_COMPLETED.to_string()]),
            AdminRequest::Cancel {
                colony_id,
                research_id,
            } => self
                .cancel(state, invoker, *colony_id, research_id, events)
                .map(|(id, outcome)| vec![cancel_message(&id, &outcome)]),
        };

        let (success, messages) = match result {
            Ok(messages) => (true, messages),
            Err(err) => {
                match &err {
                    AdminError::Internal(inner) if inner.is_internal() => {
                        tracing::error!(?request, error = %inner, "research registry out of sync with colony records");
                    }
                    AdminError::Internal(inner) => {
                        tracing::warn!(?request, error = %inner, "research command failed");
                    }
                    _ => {}
                }
                (false, vec![err.to_string()])
            }
        };
        for message in &messages {
            sink.deliver(&invoker.actor, message.clone());
        }
        CommandOutcome { success, messages }
    }

    fn authorize(&self, colony: &ColonyState, invoker: &Invoker) -> Result<(), AdminError> {
        if colony.is_officer(&invoker.actor)
            || self.privileges.has_elevated_privilege(&invoker.actor)
        {
            Ok(())
        } else {
            Err(AdminError::PermissionDenied)
        }
    }
}

fn split_colony<'s>(
    state: &'s mut GameState,
    colony_id: ColonyId,
    dimension: &DimensionId,
) -> Result<(&'s mut ColonyState, &'s mut Counters), AdminError> {
    let GameState {
        colonies, counters, ..
    } = state;
    let colony = colonies
        .iter_mut()
        .find(|colony| colony.id == colony_id && colony.dimension == *dimension)
        .ok_or(AdminError::ColonyNotFound(colony_id))?;
    Ok((colony, counters))
}

fn require_identifier(research_id: &str) -> Result<(), AdminError> {
    if research_id.trim().is_empty() {
        Err(AdminError::MissingIdentifier)
    } else {
        Ok(())
    }
}

fn list_messages(report: &ListReport) -> Vec<String> {
    match report {
        ListReport::NoResearchInProgress => vec![RESEARCH_IN_PROGRESS_EMPTY.to_string()],
        ListReport::InProgress(entries) => entries
            .iter()
            .map(|entry| format!("ID: {} ({})", entry.research_id, entry.remaining))
            .collect(),
    }
}

fn cancel_message(id: &ResearchId, outcome: &RefundOutcome) -> String {
    match outcome {
        RefundOutcome::Refunded => format!("Research {id} cancelled. Resources refunded."),
        RefundOutcome::NothingToRefund => format!("Research {id} cancelled."),
        RefundOutcome::Failed(reason) => {
            format!("Research {id} cancelled, but the refund failed: {reason}")
        }
    }
}
