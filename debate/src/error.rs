//! Failure taxonomy for debate sessions.
//!
//! Each collaborator boundary gets its own error enum; `DebateError` rolls
//! them up for the scheduler. Tool failures during a turn are NOT session
//! errors; they surface as tool-output content so the speaker can react.

use thiserror::Error;

use crate::protocol::Speaker;
use crate::state::TransitionError;

/// Agent collaborator failure: the model call failed or returned unusable
/// content. Distinct from empty output so callers can tell the two apart.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("model returned empty output")]
    EmptyOutput,

    #[error("malformed reply: {0}")]
    MalformedReply(String),

    #[error("generation timed out after {0}s")]
    Timeout(u64),
}

/// Tool collaborator failure.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArgs { tool: String, reason: String },

    #[error("invocation failed: {0}")]
    InvocationFailed(String),

    #[error("tool call timed out after {0}s")]
    Timeout(u64),
}

/// Conversation store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Invalid session configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_rounds must be between {min} and {max}, got {got}")]
    MaxRoundsOutOfRange { min: u32, max: u32, got: u32 },

    #[error("context_window must be at least 1")]
    EmptyContextWindow,

    #[error("model id for {role} must not be empty")]
    EmptyModel { role: &'static str },
}

/// Top-level session failure.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("agent failure ({role}): {source}")]
    Agent {
        role: Speaker,
        #[source]
        source: AgentError,
    },

    #[error("client closed the event stream")]
    StreamClosed,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl DebateError {
    /// Wrap an agent error with the speaking role.
    pub fn agent(role: Speaker, source: AgentError) -> Self {
        Self::Agent { role, source }
    }

    /// Whether this failure should be reported to the client as an `error`
    /// event. Cancellation (closed stream) is not reportable: there is no
    /// client left to report to.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::StreamClosed)
    }
}
