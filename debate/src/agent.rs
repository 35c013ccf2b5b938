//! Collaborator traits the scheduler depends on.
//!
//! The core crate never talks to a model provider or runs a tool itself.
//! `DebateAgent` produces statements or tool requests; `ToolExecutor` runs
//! named tools. Production implementations live in the agents crate; tests
//! substitute mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ContextWindow;
use crate::error::{AgentError, ToolError};
use crate::protocol::{Speaker, ToolCall, ToolOutput};

/// What the scheduler is asking a speaker to do this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// Moderator frames the motion.
    Opening,
    /// Proponent or Critic argues its side.
    Argument,
    /// Moderator steers between rounds.
    Steering,
    /// Moderator synthesizes the final summary.
    Closing,
    /// Short conversation title, 3 to 5 words.
    Title,
}

/// A tool the speaker may invoke this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema for the arguments object.
    pub parameters: serde_json::Value,
}

/// A tool request as the agent produced it, before the scheduler assigns a
/// call id. Providers that mint their own ids pass them through so follow-up
/// requests can echo them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// A completed call/output pair from an earlier pass of the current turn,
/// fed back to the agent so it can finalize its statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExchange {
    pub call: ToolCall,
    pub output: ToolOutput,
}

/// One generate invocation.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub speaker: Speaker,
    pub kind: TurnKind,
    /// Model id to use, selected per role by the session config.
    pub model: String,
    pub window: ContextWindow,
    /// Tools available this pass. Empty means tools are withheld and the
    /// agent must produce a statement.
    pub tools: Vec<ToolSpec>,
    /// Exchanges completed earlier in this turn.
    pub exchanges: Vec<ToolExchange>,
}

/// What an agent invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// A complete statement; the turn finalizes.
    Statement(String),
    /// The speaker wants tool results before finishing.
    ToolRequests(Vec<ToolInvocation>),
}

/// Produces a statement or tool requests for one speaker.
#[async_trait]
pub trait DebateAgent: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<AgentReply, AgentError>;
}

/// Runs named tools.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Declarations for every available tool.
    fn specs(&self) -> Vec<ToolSpec>;

    /// Invoke a tool by name. The Ok text becomes tool-output content.
    async fn invoke(&self, name: &str, args: &serde_json::Value) -> Result<String, ToolError>;
}
