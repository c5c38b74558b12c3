//! ConversationDispatcher — turns an inbound text into the outbound reply.
//!
//! This is the caller-side layer around [`FlowController`]: it decides from
//! the session state whether a message starts the form, answers a field, or
//! gets a canned reply, resolves choice answers before they are stored, and
//! renders the next prompt or the completion summary. Delivering the reply is
//! left to the caller.

use tracing::{debug, warn};

use crate::config::FlowConfig;
use crate::error::FlowError;

use super::choice::resolve_choice;
use super::controller::{Disposition, FlowController, IgnoreReason};
use super::prompts;
use super::state::FlowState;
use super::summary::FlowSummary;

/// Attempts before giving up on a session that keeps changing underneath us.
const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// What the caller should do with one inbound text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send this text back to the customer.
    Send(String),
    /// The session is with a human agent; pass the text on.
    Forward,
    /// The session kept changing under concurrent messages and nothing was
    /// routed. The caller may retry later.
    Contended,
}

impl Reply {
    /// The text to send, if any.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Send(text) => Some(text),
            Self::Forward | Self::Contended => None,
        }
    }
}

enum Step {
    Reply(Reply),
    /// The session moved between the snapshot and the mutation; look again.
    Retry,
}

fn send(text: impl Into<String>) -> Result<Step, FlowError> {
    Ok(Step::Reply(Reply::Send(text.into())))
}

/// Routes inbound texts for every session.
#[derive(Clone)]
pub struct ConversationDispatcher {
    flow: FlowController,
    trigger_keywords: Vec<String>,
    max_attempts: usize,
}

impl ConversationDispatcher {
    pub fn new(flow: FlowController, config: &FlowConfig) -> Self {
        Self {
            flow,
            trigger_keywords: config
                .trigger_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override how many times a text is re-routed when the session changes
    /// between reading its state and acting on it.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn flow(&self) -> &FlowController {
        &self.flow
    }

    /// Handle one inbound text.
    ///
    /// Every call counts as activity on the session, so a conversation that
    /// keeps talking is never swept as idle.
    pub async fn handle(&self, session_id: &str, text: &str) -> Result<Reply, FlowError> {
        for attempt in 1..=self.max_attempts {
            let snapshot = self.flow.store().touch(session_id).await;
            match self.route(&snapshot, text).await? {
                Step::Reply(reply) => return Ok(reply),
                Step::Retry => {
                    debug!(session_id = %session_id, attempt, "Session changed while routing, retrying");
                }
            }
        }
        warn!(session_id = %session_id, attempts = self.max_attempts, "Gave up routing inbound text");
        Ok(Reply::Contended)
    }

    fn is_trigger(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.trigger_keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    async fn route(&self, snapshot: &FlowSummary, text: &str) -> Result<Step, FlowError> {
        let id = snapshot.id.as_str();
        match snapshot.state {
            FlowState::Idle | FlowState::WaitingForForm => {
                if self.is_trigger(text) {
                    return match self.flow.start_form(id).await {
                        Ok(started) => send(self.next_prompt(&started)),
                        Err(FlowError::InvalidTransition { .. }) => Ok(Step::Retry),
                        Err(e) => Err(e),
                    };
                }
                if snapshot.state == FlowState::Idle {
                    match self.flow.offer_form(id).await {
                        Ok(_) => {}
                        Err(FlowError::InvalidTransition { .. }) => return Ok(Step::Retry),
                        Err(e) => return Err(e),
                    }
                }
                send(prompts::GREETING)
            }
            FlowState::FillingForm => self.answer(snapshot, text).await,
            FlowState::FormComplete | FlowState::AwaitingAgent => send(prompts::WAITING_NOTICE),
            FlowState::InConversation => Ok(Step::Reply(Reply::Forward)),
        }
    }

    async fn answer(&self, snapshot: &FlowSummary, text: &str) -> Result<Step, FlowError> {
        let model = self.flow.model();
        let Some(field) = snapshot.current_field.as_deref().and_then(|id| model.field(id)) else {
            return send(prompts::NOTHING_LEFT);
        };

        let value = match field.options() {
            Some(options) => match resolve_choice(options, text) {
                Some(option) => option.title.clone(),
                None => return send(prompts::invalid_choice(field)),
            },
            None => text.to_string(),
        };

        let outcome = self.flow.submit(&snapshot.id, &field.id, &value).await?;
        match outcome.disposition {
            Disposition::Accepted { .. } if outcome.complete => {
                if let Err(e) = self.flow.complete_form(&snapshot.id).await {
                    warn!(session_id = %snapshot.id, error = %e, "Could not hand off completed form");
                }
                send(prompts::completion_summary(model, &outcome.session))
            }
            Disposition::Accepted { .. } => send(self.next_prompt(&outcome.session)),
            Disposition::Ignored(IgnoreReason::EmptyValue) => send(prompts::field_prompt(field)),
            Disposition::Ignored(_) => Ok(Step::Retry),
        }
    }

    fn next_prompt(&self, summary: &FlowSummary) -> String {
        match summary.current_field.as_deref() {
            Some(field) => prompts::prompt_for(self.flow.model(), field),
            None => prompts::NOTHING_LEFT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::flow::model::FormModel;
    use crate::flow::store::SessionStore;

    fn dispatcher() -> ConversationDispatcher {
        let store = SessionStore::new(Arc::new(FormModel::customer_info()));
        ConversationDispatcher::new(FlowController::new(store), &FlowConfig::default())
    }

    async fn state_of(d: &ConversationDispatcher, id: &str) -> FlowState {
        d.flow().summarize(id).await.unwrap().state
    }

    #[tokio::test]
    async fn greets_until_triggered() {
        let d = dispatcher();
        let reply = d.handle("chat-1", "hi there").await.unwrap().into_text().unwrap();
        assert_eq!(reply, prompts::GREETING);
        assert_eq!(state_of(&d, "chat-1").await, FlowState::WaitingForForm);

        let reply = d.handle("chat-1", "what?").await.unwrap().into_text().unwrap();
        assert_eq!(reply, prompts::GREETING);
        assert_eq!(state_of(&d, "chat-1").await, FlowState::WaitingForForm);

        let reply = d.handle("chat-1", "I want to Sign Up").await.unwrap().into_text().unwrap();
        assert_eq!(reply, "What is your full name?");
        assert_eq!(state_of(&d, "chat-1").await, FlowState::FillingForm);
    }

    #[tokio::test]
    async fn full_walkthrough() {
        let d = dispatcher();
        let id = "chat-2";

        assert_eq!(d.handle(id, "form").await.unwrap().into_text().unwrap(), "What is your full name?");
        assert_eq!(d.handle(id, "John Doe").await.unwrap().into_text().unwrap(), "What is your company name?");

        let country_prompt = d.handle(id, "Acme Corp").await.unwrap().into_text().unwrap();
        assert!(country_prompt.contains("2. Canada"));

        let retry = d.handle(id, "Atlantis").await.unwrap().into_text().unwrap();
        assert!(retry.starts_with("Please select a valid country option (1-8)"));
        let summary = d.flow().summarize(id).await.unwrap();
        assert_eq!(summary.value("country"), None);
        assert_eq!(summary.current_field.as_deref(), Some("country"));

        assert_eq!(d.handle(id, "2").await.unwrap().into_text().unwrap(), "What is your email address?");

        let done = d.handle(id, "john@example.com").await.unwrap().into_text().unwrap();
        assert!(done.contains("• Name: John Doe"));
        assert!(done.contains("• Company: Acme Corp"));
        assert!(done.contains("• Country: Canada"));
        assert!(done.contains("• Email: john@example.com"));
        assert!(done.ends_with("An agent will be with you shortly to assist you further."));
        assert_eq!(state_of(&d, id).await, FlowState::AwaitingAgent);

        assert_eq!(d.handle(id, "hello?").await.unwrap().into_text().unwrap(), prompts::WAITING_NOTICE);

        d.flow().begin_conversation(id).await.unwrap();
        assert_eq!(d.handle(id, "are you there").await.unwrap(), Reply::Forward);
    }

    async fn hand_off(d: &ConversationDispatcher, id: &str) {
        for text in ["form", "John Doe", "Acme Corp", "2", "john@example.com"] {
            d.handle(id, text).await.unwrap();
        }
        d.flow().begin_conversation(id).await.unwrap();
    }

    #[tokio::test]
    async fn active_conversation_survives_idle_sweep() {
        let d = dispatcher();
        hand_off(&d, "chat-5").await;
        d.handle("chat-6", "hi").await.unwrap();

        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(30)).await;
            assert_eq!(d.handle("chat-5", "still here").await.unwrap(), Reply::Forward);
        }

        assert_eq!(d.flow().store().evict_idle(Duration::from_millis(200)), 1);
        assert!(d.flow().summarize("chat-6").await.is_err());
        assert_eq!(d.handle("chat-5", "hello?").await.unwrap(), Reply::Forward);
        assert_eq!(state_of(&d, "chat-5").await, FlowState::InConversation);
    }

    #[tokio::test]
    async fn exhausted_attempts_are_reported() {
        let store = SessionStore::new(Arc::new(FormModel::customer_info()));
        let d = ConversationDispatcher::new(FlowController::new(store), &FlowConfig::default())
            .with_max_attempts(0);

        let reply = d.handle("chat-7", "form").await.unwrap();
        assert_eq!(reply, Reply::Contended);
        assert_eq!(reply.into_text(), None);
        assert!(d.flow().store().is_empty());
    }

    #[tokio::test]
    async fn blank_answer_reasks() {
        let d = dispatcher();
        d.handle("chat-3", "form").await.unwrap();
        let reply = d.handle("chat-3", "   ").await.unwrap().into_text().unwrap();
        assert_eq!(reply, "What is your full name?");
        let summary = d.flow().summarize("chat-3").await.unwrap();
        assert_eq!(summary.cursor, 0);
    }

    #[tokio::test]
    async fn custom_trigger_keywords() {
        let store = SessionStore::new(Arc::new(FormModel::customer_info()));
        let config = FlowConfig {
            trigger_keywords: vec!["START".to_string()],
            ..Default::default()
        };
        let d = ConversationDispatcher::new(FlowController::new(store), &config);

        assert_eq!(d.handle("chat-4", "form").await.unwrap().into_text().unwrap(), prompts::GREETING);
        assert_eq!(
            d.handle("chat-4", "please start").await.unwrap().into_text().unwrap(),
            "What is your full name?"
        );
    }
}
