//! Per-conversation session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FlowError;

use super::model::{is_filled, FieldSpec, FormModel, FormValues};
use super::state::FlowState;

/// What a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    /// A customer answer accepted into a field.
    Input,
}

/// An append-only history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub id: Uuid,
    pub kind: HistoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEvent {
    fn input(field: &str, value: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: HistoryKind::Input,
            field: Some(field.to_string()),
            value: Some(value.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// One conversation's form-filling state.
///
/// Only ever mutated inside the session store's per-session critical section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub state: FlowState,
    pub values: FormValues,
    /// Index of the next field awaiting a value; `field_count` means none.
    pub cursor: usize,
    pub history: Vec<HistoryEvent>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Last inbound activity, including messages that change nothing.
    #[serde(default = "Utc::now")]
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(id: &str, model: &FormModel) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            state: FlowState::Idle,
            values: model.empty_values(),
            cursor: 0,
            history: Vec::new(),
            created_at: now,
            last_updated: now,
            last_seen: now,
        }
    }

    /// The field awaiting an answer, if the form is being filled.
    pub fn current_field<'m>(&self, model: &'m FormModel) -> Option<&'m FieldSpec> {
        if self.state.accepts_input() {
            model.field_at(self.cursor)
        } else {
            None
        }
    }

    pub fn is_complete(&self, model: &FormModel) -> bool {
        model.is_complete(&self.values)
    }

    /// Move to `target` if the transition table allows it.
    pub fn transition_to(&mut self, target: FlowState) -> Result<(), FlowError> {
        if !self.state.can_transition_to(target) {
            return Err(FlowError::InvalidTransition {
                session: self.id.clone(),
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        tracing::info!(session_id = %self.id, from = %self.state, to = %target, "Flow transition");
        self.state = target;
        self.touch();
        Ok(())
    }

    /// Store `value` under `field` and record it in the history.
    ///
    /// Fails without touching the session when `field` is not in the model.
    pub fn assign(&mut self, model: &FormModel, field: &str, value: &str) -> Result<(), FlowError> {
        if model.field(field).is_none() {
            return Err(FlowError::UnknownField {
                field: field.to_string(),
            });
        }
        self.values.insert(field.to_string(), Some(value.to_string()));
        self.history.push(HistoryEvent::input(field, value));
        self.touch();
        Ok(())
    }

    /// Move the cursor forward to the next unfilled field, or past the end.
    ///
    /// The cursor never moves backwards here.
    pub fn advance_cursor(&mut self, model: &FormModel) {
        let count = model.field_count();
        let start = (self.cursor + 1).min(count);
        self.cursor = (start..count)
            .find(|&i| {
                model
                    .field_at(i)
                    .is_some_and(|f| !is_filled(&self.values, &f.id))
            })
            .unwrap_or(count);
    }

    /// Point the cursor at the first unfilled field.
    pub fn rewind_to_first_unfilled(&mut self, model: &FormModel) {
        self.cursor = model
            .fields()
            .iter()
            .position(|f| !is_filled(&self.values, &f.id))
            .unwrap_or(model.field_count());
    }

    /// Return to the initial state: Idle, no values, cursor 0, no history.
    pub fn reset(&mut self, model: &FormModel) {
        self.state = FlowState::Idle;
        self.values = model.empty_values();
        self.cursor = 0;
        self.history.clear();
        self.touch();
    }

    /// Record inbound activity without changing any state.
    pub fn mark_seen(&mut self) {
        self.last_seen = Utc::now();
    }

    fn touch(&mut self) {
        let now = Utc::now();
        self.last_updated = now;
        self.last_seen = now;
    }
}
