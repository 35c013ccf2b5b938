//! Production collaborators for the debate core: OpenRouter-backed agents,
//! research tools, prompts, and application configuration.

pub mod config;
pub mod openrouter;
pub mod prompts;
pub mod tools;

pub use config::AppConfig;
pub use openrouter::OpenRouterAgent;
pub use tools::{DebateRulesTool, ToolRegistry, WebSearchTool};
