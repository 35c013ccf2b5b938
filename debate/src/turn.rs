//! One speaker's turn, including the tool-invocation sub-machine.
//!
//! A turn moves `Idle → Thinking → Finalized`. Tool passes are bounded: after
//! `MAX_TOOL_PASSES` the agent is re-invoked with tools withheld, so every
//! turn finalizes. Tool failures become tool-output content the speaker can
//! react to; they never abort the session.

use tokio::time::timeout;
use uuid::Uuid;

use crate::agent::{
    AgentReply, DebateAgent, GenerateRequest, ToolExchange, ToolExecutor, TurnKind,
};
use crate::config::DebateConfig;
use crate::context::ContextWindow;
use crate::error::{AgentError, DebateError};
use crate::protocol::{EventSink, Message, MessageRole, Speaker, StreamEvent, ToolCall, ToolOutput};

/// Tool round-trips allowed within a single turn.
pub const MAX_TOOL_PASSES: usize = 3;

/// Lifecycle of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    /// At least one tool pass is in flight; a placeholder is open client-side.
    Thinking,
    Finalized,
}

/// Runs one turn against the agent and tool collaborators, emitting events
/// as the turn progresses.
pub struct TurnRunner<'a> {
    agent: &'a dyn DebateAgent,
    tools: &'a dyn ToolExecutor,
    sink: &'a EventSink,
    config: &'a DebateConfig,
}

impl<'a> TurnRunner<'a> {
    pub fn new(
        agent: &'a dyn DebateAgent,
        tools: &'a dyn ToolExecutor,
        sink: &'a EventSink,
        config: &'a DebateConfig,
    ) -> Self {
        Self {
            agent,
            tools,
            sink,
            config,
        }
    }

    /// Execute one full turn. Returns the finalized message, with any tool
    /// calls and outputs attached.
    pub async fn run(
        &self,
        speaker: Speaker,
        kind: TurnKind,
        window: &ContextWindow,
    ) -> Result<Message, DebateError> {
        let mut state = TurnState::Idle;
        let mut exchanges: Vec<ToolExchange> = Vec::new();
        // Only argument turns get tools; moderator turns are single statements.
        let tools_allowed = self.config.enable_tools && kind == TurnKind::Argument;

        for pass in 0..=MAX_TOOL_PASSES {
            let tools = if tools_allowed && pass < MAX_TOOL_PASSES {
                self.tools.specs()
            } else {
                Vec::new()
            };
            let tools_withheld = tools.is_empty();

            let request = GenerateRequest {
                speaker,
                kind,
                model: self.config.model_for(speaker).to_string(),
                window: window.clone(),
                tools,
                exchanges: exchanges.clone(),
            };

            let reply = timeout(self.config.turn_timeout(), self.agent.generate(&request))
                .await
                .map_err(|_| {
                    DebateError::agent(speaker, AgentError::Timeout(self.config.turn_timeout_secs))
                })?
                .map_err(|err| DebateError::agent(speaker, err))?;

            match reply {
                AgentReply::Statement(content) => {
                    tracing::info!(%speaker, ?kind, pass, "turn finalized");
                    self.sink
                        .emit(StreamEvent::Message {
                            role: MessageRole::Assistant,
                            name: Some(speaker),
                            content: content.clone(),
                        })
                        .await?;
                    let (tool_calls, tool_outputs) = exchanges
                        .into_iter()
                        .map(|e| (e.call, e.output))
                        .unzip();
                    return Ok(Message {
                        role: MessageRole::Assistant,
                        name: Some(speaker),
                        content,
                        tool_calls,
                        tool_outputs,
                        is_thinking: false,
                    });
                }
                AgentReply::ToolRequests(invocations) => {
                    if tools_withheld {
                        return Err(DebateError::agent(
                            speaker,
                            AgentError::MalformedReply(
                                "tool requests after tools were withheld".to_string(),
                            ),
                        ));
                    }
                    if invocations.is_empty() {
                        return Err(DebateError::agent(
                            speaker,
                            AgentError::MalformedReply("empty tool request list".to_string()),
                        ));
                    }

                    state = TurnState::Thinking;
                    let calls: Vec<ToolCall> = invocations
                        .into_iter()
                        .map(|inv| ToolCall {
                            id: inv
                                .provider_id
                                .unwrap_or_else(|| Uuid::new_v4().to_string()),
                            name: inv.name,
                            args: inv.args,
                        })
                        .collect();

                    tracing::info!(%speaker, pass, calls = calls.len(), "tool pass");
                    self.sink
                        .emit(StreamEvent::ToolCall {
                            name: speaker,
                            calls: calls.clone(),
                        })
                        .await?;

                    for call in calls {
                        let content = self.invoke_tool(&call).await;
                        self.sink
                            .emit(StreamEvent::ToolOutput {
                                call_id: call.id.clone(),
                                content: content.clone(),
                            })
                            .await?;
                        exchanges.push(ToolExchange {
                            output: ToolOutput {
                                call_id: call.id.clone(),
                                content,
                            },
                            call,
                        });
                    }
                }
            }
        }

        // Unreachable while the loop grants a final tools-withheld pass, and
        // that pass only accepts statements.
        Err(DebateError::agent(
            speaker,
            AgentError::MalformedReply(format!(
                "turn did not finalize within {MAX_TOOL_PASSES} tool passes (state {state:?})"
            )),
        ))
    }

    /// Run one tool call. Failures and timeouts become output text.
    async fn invoke_tool(&self, call: &ToolCall) -> String {
        match timeout(
            self.config.tool_timeout(),
            self.tools.invoke(&call.name, &call.args),
        )
        .await
        {
            Ok(Ok(content)) => content,
            Ok(Err(err)) => {
                tracing::warn!(tool = %call.name, %err, "tool failed");
                format!("Tool '{}' failed: {err}", call.name)
            }
            Err(_) => {
                tracing::warn!(tool = %call.name, "tool timed out");
                format!(
                    "Tool '{}' timed out after {}s",
                    call.name, self.config.tool_timeout_secs
                )
            }
        }
    }
}
