//! Per-session debate configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bounds for `max_rounds`.
pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 10;

fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

fn default_max_rounds() -> u32 {
    3
}

fn default_enable_tools() -> bool {
    true
}

fn default_context_window() -> usize {
    6
}

fn default_turn_timeout() -> u64 {
    120
}

fn default_tool_timeout() -> u64 {
    30
}

/// Settings for one debate session.
///
/// The scheduler takes its own copy at session start, so mutating a config
/// after spawning a session never affects the running session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateConfig {
    /// Model id for the Proponent.
    #[serde(default = "default_model")]
    pub pro_model: String,
    /// Model id for the Critic.
    #[serde(default = "default_model")]
    pub con_model: String,
    /// Model id for the Moderator.
    #[serde(default = "default_model")]
    pub moderator_model: String,
    /// Proponent+Critic rounds before the Moderator closes. 1 to 10.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Whether speakers may invoke tools mid-turn.
    #[serde(default = "default_enable_tools")]
    pub enable_tools: bool,
    /// How many recent transcript entries each speaker sees.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    /// Upper bound on a single agent invocation, in seconds.
    #[serde(default = "default_turn_timeout")]
    pub turn_timeout_secs: u64,
    /// Upper bound on a single tool invocation, in seconds.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            pro_model: default_model(),
            con_model: default_model(),
            moderator_model: default_model(),
            max_rounds: default_max_rounds(),
            enable_tools: default_enable_tools(),
            context_window: default_context_window(),
            turn_timeout_secs: default_turn_timeout(),
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

impl DebateConfig {
    /// Check the config before a session starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds < MIN_ROUNDS || self.max_rounds > MAX_ROUNDS {
            return Err(ConfigError::MaxRoundsOutOfRange {
                min: MIN_ROUNDS,
                max: MAX_ROUNDS,
                got: self.max_rounds,
            });
        }
        if self.context_window == 0 {
            return Err(ConfigError::EmptyContextWindow);
        }
        for (role, model) in [
            ("Proponent", &self.pro_model),
            ("Critic", &self.con_model),
            ("Moderator", &self.moderator_model),
        ] {
            if model.trim().is_empty() {
                return Err(ConfigError::EmptyModel { role });
            }
        }
        Ok(())
    }

    /// Model id for the given speaker.
    pub fn model_for(&self, speaker: crate::protocol::Speaker) -> &str {
        use crate::protocol::Speaker;
        match speaker {
            Speaker::Proponent => &self.pro_model,
            Speaker::Critic => &self.con_model,
            Speaker::Moderator => &self.moderator_model,
        }
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}
