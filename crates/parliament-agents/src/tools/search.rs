//! Web search via the Brave Search API.
//!
//! Search trouble is debate content, not an engine failure: a missing key,
//! an HTTP error, or an empty result set all come back as descriptive output
//! text so the speaker can argue around it.

use std::time::Duration;

use anyhow::{Context, Result};

use debate::{ToolError, ToolSpec};

const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const MAX_RESULTS: usize = 5;

pub struct WebSearchTool {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub const NAME: &'static str = "search_web";

    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { api_key, client })
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: "Search the web for current facts, figures, and news".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query",
                    },
                },
                "required": ["query"],
            }),
        }
    }

    pub async fn invoke(&self, args: &serde_json::Value) -> Result<String, ToolError> {
        let query = args["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidArgs {
                tool: Self::NAME.to_string(),
                reason: "missing or empty 'query'".to_string(),
            })?;

        let Some(api_key) = &self.api_key else {
            return Ok(
                "Web search is disabled: no BRAVE_API_KEY configured. \
                 Argue from general knowledge and say so."
                    .to_string(),
            );
        };

        tracing::debug!(query, "web search");
        let response = self
            .client
            .get(BRAVE_SEARCH_URL)
            .query(&[("q", query), ("count", "5")])
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                let status = response.status();
                tracing::warn!(%status, "search request rejected");
                return Ok(format!("Web search failed with HTTP {status}."));
            }
            Err(err) => {
                tracing::warn!(%err, "search request failed");
                return Ok(format!("Web search failed: {err}."));
            }
        };

        match response.json::<serde_json::Value>().await {
            Ok(body) => Ok(format_results(query, &body)),
            Err(err) => {
                tracing::warn!(%err, "search response unreadable");
                Ok(format!("Web search returned an unreadable response: {err}."))
            }
        }
    }
}

/// Render a Brave response body as numbered result lines.
fn format_results(query: &str, body: &serde_json::Value) -> String {
    let results = match body["web"]["results"].as_array() {
        Some(results) if !results.is_empty() => results,
        _ => return format!("Web search for '{query}' returned no results."),
    };

    let mut out = format!("Web search results for '{query}':\n");
    for (i, result) in results.iter().take(MAX_RESULTS).enumerate() {
        let title = result["title"].as_str().unwrap_or("(untitled)");
        let url = result["url"].as_str().unwrap_or("");
        let description = result["description"].as_str().unwrap_or("");
        out.push_str(&format!("{}. {title} ({url})\n   {description}\n", i + 1));
    }
    out
}
