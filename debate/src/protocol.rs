//! Streamed event protocol between the orchestrator and its client.
//!
//! A debate session is a single logical stream of discrete, ordered events.
//! Events for one speaker's turn are emitted in the sequence `tool_call*`,
//! `tool_output*` (interleaved per pass), then exactly one finalizing
//! `message`. Turns never interleave: the scheduler executes one turn at a
//! time.
//!
//! Tool outputs carry the id of the call they answer. Ids are minted when
//! the `tool_call` event is emitted, so a client never has to guess which
//! in-flight call an output belongs to.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::DebateError;

/// Identifier correlating a tool output with the call that produced it.
pub type CallId = String;

/// Fixed content of an open thinking placeholder awaiting finalization.
pub const THINKING_PLACEHOLDER: &str = "Analyzing...";

/// The three debate roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Moderator,
    Proponent,
    Critic,
}

impl Speaker {
    /// Speaker label as it appears in message `name` fields.
    pub fn label(self) -> &'static str {
        match self {
            Self::Moderator => "Moderator",
            Self::Proponent => "Proponent",
            Self::Critic => "Critic",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Chat role of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single tool invocation requested by a role mid-turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Id assigned when the `tool_call` event was emitted.
    pub id: CallId,
    /// Tool name, e.g. `search_web`.
    pub name: String,
    /// Structured arguments payload.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Result of a previously requested tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Id of the call this output answers.
    pub call_id: CallId,
    /// Text result (or a description of the tool failure).
    pub content: String,
}

/// One entry in a conversation transcript.
///
/// Invariant: at most one message in a transcript has `is_thinking = true`,
/// and if present it is the last message. The transcript is otherwise
/// append-only; the only in-place mutation is finalizing (or extending the
/// tool data on) that trailing thinking message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    /// Speaker label; `None` for user/system messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Speaker>,
    /// Markdown text.
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_outputs: Vec<ToolOutput>,
    /// True while this message is an open placeholder awaiting its
    /// finalizing statement.
    #[serde(default)]
    pub is_thinking: bool,
}

impl Message {
    /// A user message carrying the motion text.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            name: None,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_outputs: Vec::new(),
            is_thinking: false,
        }
    }

    /// A finalized assistant statement from a speaker.
    pub fn statement(speaker: Speaker, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            name: Some(speaker),
            content: content.into(),
            tool_calls: Vec::new(),
            tool_outputs: Vec::new(),
            is_thinking: false,
        }
    }

    /// An open thinking placeholder for a speaker that has started tool use.
    pub fn thinking(speaker: Speaker, calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            name: Some(speaker),
            content: THINKING_PLACEHOLDER.to_string(),
            tool_calls: calls,
            tool_outputs: Vec::new(),
            is_thinking: true,
        }
    }
}

/// Events pushed from the orchestrator to the client, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A role has produced a complete statement (possibly finalizing a
    /// prior thinking placeholder).
    Message {
        role: MessageRole,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<Speaker>,
        content: String,
    },
    /// The named role is invoking one or more tools before finishing its
    /// statement.
    ToolCall {
        name: Speaker,
        #[serde(rename = "tool_calls")]
        calls: Vec<ToolCall>,
    },
    /// Result of a previously requested tool call.
    ToolOutput {
        #[serde(rename = "tool_call_id")]
        call_id: CallId,
        content: String,
    },
    /// Engine diagnostic (continuation decision, relevance check).
    /// Informational only; never mutates the transcript.
    Status { detail: String },
    /// The conversation's title has been (re)computed; the client should
    /// refresh conversation metadata.
    Title { title: String },
    /// The session has produced no further events.
    Complete,
    /// Terminal failure; no further events follow.
    Error { message: String },
}

impl StreamEvent {
    /// Wire tag of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolOutput { .. } => "tool_output",
            Self::Status { .. } => "status",
            Self::Title { .. } => "title",
            Self::Complete => "complete",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event ends the session (`complete` or `error`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error { .. })
    }
}

/// Sending half of a session's event stream.
///
/// A failed send means the client dropped its receiver (navigated away or
/// aborted); the scheduler treats that as cancellation and stops emitting.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl EventSink {
    /// Default channel capacity for a session stream.
    pub const CHANNEL_CAPACITY: usize = 64;

    /// Create a sink/receiver pair for one session.
    pub fn channel() -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(Self::CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }

    /// Push one event to the client, in order.
    pub async fn emit(&self, event: StreamEvent) -> Result<(), DebateError> {
        let event_type = event.event_type();
        match self.tx.send(event).await {
            Ok(()) => {
                tracing::debug!(event_type, "event emitted");
                Ok(())
            }
            Err(_) => {
                tracing::debug!(event_type, "client gone, stream closed");
                Err(DebateError::StreamClosed)
            }
        }
    }
}
