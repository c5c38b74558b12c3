//! Read-only session snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{FormModel, FormValues};
use super::session::{HistoryEvent, Session};
use super::state::FlowState;

/// An owned copy of a session for reporting and debugging.
///
/// Shares nothing with the live session; mutating it has no effect on the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub id: String,
    pub state: FlowState,
    pub values: FormValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_field: Option<String>,
    pub cursor: usize,
    pub complete: bool,
    pub history: Vec<HistoryEvent>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl FlowSummary {
    /// Snapshot `session`. Call while holding the session lock.
    pub fn capture(session: &Session, model: &FormModel) -> Self {
        Self {
            id: session.id.clone(),
            state: session.state,
            values: session.values.clone(),
            current_field: session.current_field(model).map(|f| f.id.clone()),
            cursor: session.cursor,
            complete: session.is_complete(model),
            history: session.history.clone(),
            created_at: session.created_at,
            last_updated: session.last_updated,
            last_seen: session.last_seen,
        }
    }

    /// The stored value for `field`, if any.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(|v| v.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_independent_of_session() {
        let model = FormModel::customer_info();
        let mut session = Session::new("chat-9", &model);
        session.transition_to(FlowState::FillingForm).unwrap();
        session.assign(&model, "name", "Ada").unwrap();

        let mut summary = FlowSummary::capture(&session, &model);
        summary.values.insert("name".to_string(), Some("Mallory".to_string()));
        summary.history.clear();

        assert_eq!(session.values["name"].as_deref(), Some("Ada"));
        assert_eq!(session.history.len(), 1);
    }

    #[test]
    fn summary_reports_current_field_and_completion() {
        let model = FormModel::customer_info();
        let mut session = Session::new("chat-9", &model);
        session.transition_to(FlowState::FillingForm).unwrap();

        let summary = FlowSummary::capture(&session, &model);
        assert_eq!(summary.current_field.as_deref(), Some("name"));
        assert!(!summary.complete);
        assert_eq!(summary.value("name"), None);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["state"], "filling_form");
        assert_eq!(json["current_field"], "name");
    }
}
