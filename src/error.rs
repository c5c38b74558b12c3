//! Error types for the intake flow.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised by the form model, the session store and the flow controller.
///
/// Ignored input (text outside form filling, an empty answer, a stale answer)
/// is not an error; see [`crate::flow::Disposition`].
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    #[error("Field {field} is not part of the form model")]
    UnknownField { field: String },

    #[error("Field {field} is declared more than once in the form model")]
    DuplicateField { field: String },

    #[error("Form model must declare at least one field")]
    EmptyModel,

    #[error("Session {session} is in state {from}, cannot transition to {to}")]
    InvalidTransition {
        session: String,
        from: String,
        to: String,
    },
}
