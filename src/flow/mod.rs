//! Intake flow — per-session, multi-step form collection.
//!
//! A session starts idle, is offered the form, answers one field per inbound
//! message, and is handed to a human agent once every required field holds a
//! value. The [`SessionStore`] owns all sessions; the [`FlowController`]
//! applies the transition rules; the [`ConversationDispatcher`] turns inbound
//! text into the next outbound reply.

pub mod choice;
pub mod controller;
pub mod dispatcher;
pub mod model;
pub mod prompts;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod summary;

pub use controller::{Disposition, FlowController, IgnoreReason, ProcessOutcome};
pub use dispatcher::{ConversationDispatcher, Reply};
pub use model::{ChoiceOption, FieldKind, FieldSpec, FormModel, FormValues};
pub use routes::{FlowRouteState, flow_routes};
pub use session::{HistoryEvent, HistoryKind, Session};
pub use state::FlowState;
pub use store::{SessionStore, spawn_eviction_task};
pub use summary::FlowSummary;
