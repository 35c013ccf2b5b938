//! Tools speakers may invoke mid-turn.
//!
//! The registry is the crate's `ToolExecutor`: it owns every concrete tool,
//! exposes their declarations, and dispatches invocations by name.

mod search;

pub use search::WebSearchTool;

use async_trait::async_trait;

use debate::{ToolError, ToolExecutor, ToolSpec};

use crate::config::AppConfig;

/// Standing orders returned by the `debate_rules` tool.
const STANDING_ORDERS: &str = r#"Standing orders of this debate:
1. The Proponent argues for the motion; the Critic argues against it.
2. Speakers address the motion and the opposing side's latest statement.
3. Each statement stays under 150 words.
4. Factual claims should cite evidence; use the search tool for current facts.
5. The Moderator may steer between rounds and delivers the closing synthesis.
6. Nobody declares a winner; the closing synthesis compares positions."#;

/// Returns the standing orders. Useful when a speaker wants to call out a
/// procedural violation by the other side.
pub struct DebateRulesTool;

impl DebateRulesTool {
    pub const NAME: &'static str = "debate_rules";

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: "Look up the standing orders governing this debate".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
            }),
        }
    }

    fn invoke(&self) -> String {
        STANDING_ORDERS.to_string()
    }
}

/// All tools available to speakers.
pub struct ToolRegistry {
    search: WebSearchTool,
    rules: DebateRulesTool,
}

impl ToolRegistry {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            search: WebSearchTool::new(config.brave_api_key.clone())?,
            rules: DebateRulesTool,
        })
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    fn specs(&self) -> Vec<ToolSpec> {
        vec![self.search.spec(), self.rules.spec()]
    }

    async fn invoke(&self, name: &str, args: &serde_json::Value) -> Result<String, ToolError> {
        match name {
            WebSearchTool::NAME => self.search.invoke(args).await,
            DebateRulesTool::NAME => Ok(self.rules.invoke()),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}
