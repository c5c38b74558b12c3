//! FlowController — drives sessions through the intake state machine.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::FlowError;

use super::model::FormModel;
use super::session::Session;
use super::state::FlowState;
use super::store::SessionStore;
use super::summary::FlowSummary;

/// Why an inbound text was not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The session is not filling the form; the text belongs to someone else.
    NotFilling { state: FlowState },
    /// Filling the form but every field has been passed.
    NoCurrentField,
    /// Nothing left after trimming.
    EmptyValue,
    /// The answer targeted a field that is no longer current.
    StaleField {
        expected: String,
        current: String,
    },
}

/// What happened to an inbound text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Accepted { field: String },
    Ignored(IgnoreReason),
}

/// Result of feeding one inbound text to a session.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// The session as it stands after this call.
    pub session: FlowSummary,
    /// True when this call completed the form.
    pub complete: bool,
    pub disposition: Disposition,
}

impl ProcessOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self.disposition, Disposition::Accepted { .. })
    }
}

/// State machine driver. All mutation happens inside the store's
/// per-session critical section, one call at a time.
#[derive(Clone)]
pub struct FlowController {
    store: Arc<SessionStore>,
}

impl FlowController {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn model(&self) -> &FormModel {
        self.store.model()
    }

    /// Store `text` as the answer to the session's current field.
    ///
    /// Text outside form filling, with no current field, or blank after
    /// trimming is ignored and reported through the disposition.
    pub async fn process(&self, session_id: &str, text: &str) -> Result<ProcessOutcome, FlowError> {
        self.store
            .with_session(session_id, |session, model| apply_input(session, model, None, text))
            .await
    }

    /// Like [`FlowController::process`], but only if `field` is still the
    /// current field. An answer prepared against an earlier view of the
    /// session is ignored instead of landing in a later field.
    pub async fn submit(
        &self,
        session_id: &str,
        field: &str,
        text: &str,
    ) -> Result<ProcessOutcome, FlowError> {
        self.store
            .with_session(session_id, |session, model| {
                apply_input(session, model, Some(field), text)
            })
            .await
    }

    /// Idle / WaitingForForm → FillingForm, cursor on the first field.
    pub async fn start_form(&self, session_id: &str) -> Result<FlowSummary, FlowError> {
        self.store
            .with_session(session_id, |session, model| {
                session.transition_to(FlowState::FillingForm)?;
                session.rewind_to_first_unfilled(model);
                Ok(FlowSummary::capture(session, model))
            })
            .await
            .inspect_err(|e| warn!(session_id = %session_id, error = %e, "Cannot start form"))
    }

    /// Idle → WaitingForForm, after the customer has been offered the form.
    pub async fn offer_form(&self, session_id: &str) -> Result<FlowSummary, FlowError> {
        self.transition(session_id, FlowState::WaitingForForm).await
    }

    /// FormComplete → AwaitingAgent.
    pub async fn complete_form(&self, session_id: &str) -> Result<FlowSummary, FlowError> {
        self.transition(session_id, FlowState::AwaitingAgent).await
    }

    /// AwaitingAgent → InConversation.
    pub async fn begin_conversation(&self, session_id: &str) -> Result<FlowSummary, FlowError> {
        self.transition(session_id, FlowState::InConversation).await
    }

    /// Return a known session to Idle with no values and no history.
    /// Unknown ids are left alone.
    pub async fn reset_flow(&self, session_id: &str) -> bool {
        self.store.reset(session_id).await
    }

    /// Snapshot of a known session.
    pub async fn summarize(&self, session_id: &str) -> Result<FlowSummary, FlowError> {
        self.store
            .summarize(session_id)
            .await
            .ok_or_else(|| FlowError::SessionNotFound {
                id: session_id.to_string(),
            })
    }

    async fn transition(&self, session_id: &str, target: FlowState) -> Result<FlowSummary, FlowError> {
        self.store
            .with_session(session_id, |session, model| {
                session.transition_to(target)?;
                Ok(FlowSummary::capture(session, model))
            })
            .await
            .inspect_err(|e| warn!(session_id = %session_id, error = %e, "Transition rejected"))
    }
}

fn apply_input(
    session: &mut Session,
    model: &FormModel,
    expected: Option<&str>,
    text: &str,
) -> Result<ProcessOutcome, FlowError> {
    session.mark_seen();
    if let Some(field) = expected {
        if model.field(field).is_none() {
            return Err(FlowError::UnknownField {
                field: field.to_string(),
            });
        }
    }

    if !session.state.accepts_input() {
        let reason = IgnoreReason::NotFilling { state: session.state };
        return Ok(ignored(session, model, reason));
    }
    let Some(current) = session.current_field(model) else {
        return Ok(ignored(session, model, IgnoreReason::NoCurrentField));
    };
    if let Some(field) = expected {
        if field != current.id {
            let reason = IgnoreReason::StaleField {
                expected: field.to_string(),
                current: current.id.clone(),
            };
            return Ok(ignored(session, model, reason));
        }
    }
    let value = text.trim();
    if value.is_empty() {
        return Ok(ignored(session, model, IgnoreReason::EmptyValue));
    }

    let field = current.id.clone();
    session.assign(model, &field, value)?;
    session.advance_cursor(model);

    let complete = session.is_complete(model);
    if complete {
        session.transition_to(FlowState::FormComplete)?;
        info!(session_id = %session.id, "Form complete");
    }

    Ok(ProcessOutcome {
        session: FlowSummary::capture(session, model),
        complete,
        disposition: Disposition::Accepted { field },
    })
}

fn ignored(session: &Session, model: &FormModel, reason: IgnoreReason) -> ProcessOutcome {
    debug!(session_id = %session.id, reason = ?reason, "Inbound text ignored");
    ProcessOutcome {
        session: FlowSummary::capture(session, model),
        complete: false,
        disposition: Disposition::Ignored(reason),
    }
}
