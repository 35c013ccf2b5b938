//! OpenRouter-backed implementation of `DebateAgent`.
//!
//! Every role goes through the same chat-completions endpoint; the model id
//! comes from the request (per-role session config), except title turns,
//! which use the cheap dedicated title model.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use debate::{AgentError, AgentReply, DebateAgent, GenerateRequest, ToolInvocation, TurnKind};

use crate::config::AppConfig;
use crate::prompts;

pub struct OpenRouterAgent {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    referer: String,
    app_title: String,
    title_model: String,
}

impl OpenRouterAgent {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            referer: config.referer.clone(),
            app_title: config.app_title.clone(),
            title_model: config.title_model.clone(),
        })
    }

    /// Chat message list: system prompt, rendered context, then echoes of
    /// this turn's completed tool exchanges so the model can finalize.
    fn build_messages(request: &GenerateRequest) -> Vec<serde_json::Value> {
        let mut messages = vec![
            serde_json::json!({
                "role": "system",
                "content": prompts::system_prompt(request.kind, request.speaker),
            }),
            serde_json::json!({
                "role": "user",
                "content": prompts::user_prompt(request),
            }),
        ];

        if !request.exchanges.is_empty() {
            let tool_calls: Vec<serde_json::Value> = request
                .exchanges
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "id": e.call.id,
                        "type": "function",
                        "function": {
                            "name": e.call.name,
                            "arguments": e.call.args.to_string(),
                        },
                    })
                })
                .collect();
            messages.push(serde_json::json!({
                "role": "assistant",
                "content": serde_json::Value::Null,
                "tool_calls": tool_calls,
            }));
            for exchange in &request.exchanges {
                messages.push(serde_json::json!({
                    "role": "tool",
                    "tool_call_id": exchange.output.call_id,
                    "content": exchange.output.content,
                }));
            }
        }

        messages
    }

    fn build_body(&self, request: &GenerateRequest) -> serde_json::Value {
        let model = if request.kind == TurnKind::Title {
            self.title_model.as_str()
        } else {
            request.model.as_str()
        };

        let mut body = serde_json::json!({
            "model": model,
            "messages": Self::build_messages(request),
        });

        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|spec| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": spec.name,
                            "description": spec.description,
                            "parameters": spec.parameters,
                        },
                    })
                })
                .collect();
            body["tools"] = serde_json::Value::Array(tools);
            body["tool_choice"] = serde_json::json!("auto");
        }

        body
    }

    /// Interpret a chat-completions response body.
    pub fn parse_reply(value: &serde_json::Value) -> Result<AgentReply, AgentError> {
        let message = &value["choices"][0]["message"];
        if message.is_null() {
            return Err(AgentError::MalformedReply(
                "response has no choices".to_string(),
            ));
        }

        if let Some(tool_calls) = message["tool_calls"].as_array() {
            if !tool_calls.is_empty() {
                let invocations = tool_calls
                    .iter()
                    .map(|call| {
                        let name = call["function"]["name"].as_str().ok_or_else(|| {
                            AgentError::MalformedReply("tool call without a name".to_string())
                        })?;
                        // Arguments arrive as a JSON-encoded string.
                        let args = call["function"]["arguments"]
                            .as_str()
                            .and_then(|raw| serde_json::from_str(raw).ok())
                            .unwrap_or_else(|| serde_json::json!({}));
                        Ok(ToolInvocation {
                            provider_id: call["id"].as_str().map(String::from),
                            name: name.to_string(),
                            args,
                        })
                    })
                    .collect::<Result<Vec<_>, AgentError>>()?;
                return Ok(AgentReply::ToolRequests(invocations));
            }
        }

        match message["content"].as_str().map(str::trim) {
            Some("") | None => Err(AgentError::EmptyOutput),
            Some(content) => Ok(AgentReply::Statement(content.to_string())),
        }
    }
}

#[async_trait]
impl DebateAgent for OpenRouterAgent {
    async fn generate(&self, request: &GenerateRequest) -> Result<AgentReply, AgentError> {
        let body = self.build_body(request);
        tracing::debug!(
            speaker = %request.speaker,
            kind = ?request.kind,
            model = %body["model"],
            "chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::RequestFailed(format!(
                "OpenRouter API error ({status}): {body}"
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AgentError::MalformedReply(e.to_string()))?;
        Self::parse_reply(&value)
    }
}
