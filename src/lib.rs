//! Intake Flow — conversational form collection for chat sessions.

pub mod command;
pub mod config;
pub mod error;
pub mod flow;
