//! Three-role LLM debate orchestration.
//!
//! This crate is the provider-agnostic core of the debate engine:
//! - a turn-taking phase machine (Proponent, Critic, Moderator) with bounded
//!   rounds and a Moderator closing synthesis;
//! - a tool-invocation sub-machine letting a speaker pause its turn, run
//!   tools, and finalize an informed statement;
//! - the ordered event stream pushed to the client, and the pure-reducer
//!   transcript assembler that folds it back into a message list;
//! - collaborator traits ([`agent::DebateAgent`], [`agent::ToolExecutor`],
//!   [`store::ConversationStore`]) that production crates implement.
//!
//! # Usage
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use debate::{DebateConfig, DebateScheduler, TranscriptState};
//! # async fn run(
//! #     agent: Arc<dyn debate::DebateAgent>,
//! #     tools: Arc<dyn debate::ToolExecutor>,
//! #     store: Arc<dyn debate::ConversationStore>,
//! # ) -> anyhow::Result<()> {
//! let scheduler = Arc::new(DebateScheduler::new(
//!     agent,
//!     tools,
//!     store,
//!     DebateConfig::default(),
//! )?);
//!
//! let (id, mut rx) = scheduler.spawn("This house would ban...".into(), None);
//! let mut transcript = TranscriptState::new();
//! while let Some(event) = rx.recv().await {
//!     let done = event.is_terminal();
//!     transcript = transcript.apply(&event);
//!     if done {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod protocol;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod transcript;
pub mod turn;

pub use agent::{
    AgentReply, DebateAgent, GenerateRequest, ToolExchange, ToolExecutor, ToolInvocation,
    ToolSpec, TurnKind,
};
pub use config::DebateConfig;
pub use context::ContextWindow;
pub use error::{AgentError, ConfigError, DebateError, StoreError, ToolError};
pub use protocol::{
    CallId, EventSink, Message, MessageRole, Speaker, StreamEvent, ToolCall, ToolOutput,
};
pub use scheduler::{DebateScheduler, FALLBACK_TITLE};
pub use state::{DebatePhase, DebateSession, PhaseTransition, TransitionError};
pub use store::{Conversation, ConversationStore, ConversationSummary, JsonFileStore};
pub use transcript::TranscriptState;
pub use turn::{TurnRunner, TurnState, MAX_TOOL_PASSES};
