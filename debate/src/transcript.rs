//! Client-side transcript assembler.
//!
//! `TranscriptState` folds the ordered event stream into the message list a
//! client renders. The reducer is pure: `apply` consumes the old state and
//! returns the next one, so replaying the same events always rebuilds the
//! same transcript.

use crate::protocol::{Message, MessageRole, Speaker, StreamEvent, ToolOutput};

/// Assembled view of one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptState {
    pub messages: Vec<Message>,
    /// True while the session may still emit events.
    pub loading: bool,
    /// Failure payload from a terminal `error` event.
    pub error: Option<String>,
    /// Latest announced title, if any. Set by `title` events; the client
    /// refreshes its conversation list when this changes.
    pub title: Option<String>,
}

impl Default for TranscriptState {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptState {
    /// Fresh state for a session about to stream.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            loading: true,
            error: None,
            title: None,
        }
    }

    /// Resume from persisted messages (e.g. reopening a conversation).
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            loading: true,
            error: None,
            title: None,
        }
    }

    /// Whether the trailing message is an open thinking placeholder.
    pub fn has_open_placeholder(&self) -> bool {
        self.messages.last().map(|m| m.is_thinking).unwrap_or(false)
    }

    /// Fold one event into the transcript.
    pub fn apply(mut self, event: &StreamEvent) -> Self {
        match event {
            StreamEvent::Message {
                role,
                name,
                content,
            } => self.apply_message(*role, *name, content),
            StreamEvent::ToolCall { name, calls } => {
                match self.messages.last_mut() {
                    Some(last) if last.is_thinking && last.name == Some(*name) => {
                        last.tool_calls.extend(calls.iter().cloned());
                    }
                    _ => {
                        self.messages.push(Message::thinking(*name, calls.clone()));
                    }
                }
                self
            }
            StreamEvent::ToolOutput { call_id, content } => {
                self.apply_tool_output(call_id, content)
            }
            // Diagnostics never touch the message sequence.
            StreamEvent::Status { .. } => self,
            StreamEvent::Title { title } => {
                self.title = Some(title.clone());
                self
            }
            StreamEvent::Complete => {
                self.loading = false;
                self
            }
            StreamEvent::Error { message } => {
                self.loading = false;
                self.error = Some(message.clone());
                // A half-built turn never renders.
                if self.has_open_placeholder() {
                    self.messages.pop();
                }
                self
            }
        }
    }

    fn apply_message(
        mut self,
        role: MessageRole,
        name: Option<Speaker>,
        content: &str,
    ) -> Self {
        if let Some(last) = self.messages.last_mut() {
            if last.is_thinking && last.name == name {
                last.content = content.to_string();
                last.is_thinking = false;
                return self;
            }
        }

        let duplicate = self.messages.iter().any(|m| {
            !m.is_thinking && m.role == role && m.name == name && m.content == content
        });
        if duplicate {
            return self;
        }

        self.messages.push(Message {
            role,
            name,
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_outputs: Vec::new(),
            is_thinking: false,
        });
        self
    }

    fn apply_tool_output(mut self, call_id: &str, content: &str) -> Self {
        let output = ToolOutput {
            call_id: call_id.to_string(),
            content: content.to_string(),
        };

        // Match by call id first, newest message wins.
        if let Some(message) = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.tool_calls.iter().any(|c| c.id == call_id))
        {
            message.tool_outputs.push(output);
            return self;
        }

        // Positional fallback: attach to the open placeholder.
        if let Some(last) = self.messages.last_mut() {
            if last.is_thinking {
                last.tool_outputs.push(output);
                return self;
            }
        }

        tracing::warn!(call_id, "tool output with no matching call, dropped");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ToolCall;

    fn message(speaker: Speaker, content: &str) -> StreamEvent {
        StreamEvent::Message {
            role: MessageRole::Assistant,
            name: Some(speaker),
            content: content.to_string(),
        }
    }

    fn tool_call(speaker: Speaker, id: &str) -> StreamEvent {
        StreamEvent::ToolCall {
            name: speaker,
            calls: vec![ToolCall {
                id: id.to_string(),
                name: "search_web".to_string(),
                args: serde_json::json!({"query": "q"}),
            }],
        }
    }

    #[test]
    fn test_plain_turn_appends() {
        let state = TranscriptState::new()
            .apply(&message(Speaker::Moderator, "welcome"))
            .apply(&message(Speaker::Proponent, "point one"));

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].content, "point one");
        assert!(state.loading);
    }

    #[test]
    fn test_tool_flow_finalizes_in_place() {
        let state = TranscriptState::new()
            .apply(&tool_call(Speaker::Critic, "c-1"))
            .apply(&StreamEvent::ToolOutput {
                call_id: "c-1".to_string(),
                content: "result".to_string(),
            })
            .apply(&message(Speaker::Critic, "informed rebuttal"));

        assert_eq!(state.messages.len(), 1);
        let msg = &state.messages[0];
        assert!(!msg.is_thinking);
        assert_eq!(msg.content, "informed rebuttal");
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_outputs.len(), 1);
        assert_eq!(msg.tool_outputs[0].call_id, "c-1");
    }

    #[test]
    fn test_placeholder_shows_thinking_text() {
        let state = TranscriptState::new().apply(&tool_call(Speaker::Proponent, "c-1"));
        assert!(state.has_open_placeholder());
        assert_eq!(state.messages[0].content, crate::protocol::THINKING_PLACEHOLDER);
    }

    #[test]
    fn test_second_tool_call_extends_placeholder() {
        let state = TranscriptState::new()
            .apply(&tool_call(Speaker::Proponent, "c-1"))
            .apply(&tool_call(Speaker::Proponent, "c-2"));

        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].tool_calls.len(), 2);
    }

    #[test]
    fn test_output_matched_by_call_id_across_messages() {
        // Output for an already-finalized turn still lands on that turn.
        let state = TranscriptState::new()
            .apply(&tool_call(Speaker::Proponent, "c-1"))
            .apply(&message(Speaker::Proponent, "done"))
            .apply(&StreamEvent::ToolOutput {
                call_id: "c-1".to_string(),
                content: "late result".to_string(),
            });

        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].tool_outputs[0].content, "late result");
    }

    #[test]
    fn test_output_positional_fallback() {
        let state = TranscriptState::new()
            .apply(&tool_call(Speaker::Critic, "c-1"))
            .apply(&StreamEvent::ToolOutput {
                call_id: "unknown".to_string(),
                content: "result".to_string(),
            });

        assert_eq!(state.messages[0].tool_outputs.len(), 1);
    }

    #[test]
    fn test_orphan_output_dropped() {
        let state = TranscriptState::new()
            .apply(&message(Speaker::Moderator, "welcome"))
            .apply(&StreamEvent::ToolOutput {
                call_id: "ghost".to_string(),
                content: "result".to_string(),
            });

        assert!(state.messages[0].tool_outputs.is_empty());
    }

    #[test]
    fn test_duplicate_message_discarded() {
        let event = message(Speaker::Proponent, "same point");
        let state = TranscriptState::new().apply(&event).apply(&event);
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn test_dedup_allows_different_speakers_same_text() {
        let state = TranscriptState::new()
            .apply(&message(Speaker::Proponent, "I agree"))
            .apply(&message(Speaker::Critic, "I agree"));
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn test_status_and_title_leave_messages_untouched() {
        let state = TranscriptState::new()
            .apply(&message(Speaker::Moderator, "welcome"))
            .apply(&StreamEvent::Status {
                detail: "proponent speaks next".to_string(),
            })
            .apply(&StreamEvent::Title {
                title: "Plastics Ban".to_string(),
            });

        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.title.as_deref(), Some("Plastics Ban"));
    }

    #[test]
    fn test_complete_clears_loading() {
        let state = TranscriptState::new().apply(&StreamEvent::Complete);
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_error_records_payload_and_drops_placeholder() {
        let state = TranscriptState::new()
            .apply(&message(Speaker::Moderator, "welcome"))
            .apply(&tool_call(Speaker::Proponent, "c-1"))
            .apply(&StreamEvent::Error {
                message: "agent failure".to_string(),
            });

        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("agent failure"));
        assert_eq!(state.messages.len(), 1);
        assert!(!state.has_open_placeholder());
    }

    #[test]
    fn test_replay_is_deterministic() {
        let events = vec![
            message(Speaker::Moderator, "welcome"),
            tool_call(Speaker::Proponent, "c-1"),
            StreamEvent::ToolOutput {
                call_id: "c-1".to_string(),
                content: "result".to_string(),
            },
            message(Speaker::Proponent, "point"),
            StreamEvent::Complete,
        ];

        let fold = |events: &[StreamEvent]| {
            events
                .iter()
                .fold(TranscriptState::new(), |state, event| state.apply(event))
        };
        assert_eq!(fold(&events), fold(&events));
    }

    #[test]
    fn test_resume_from_persisted_messages() {
        let state = TranscriptState::with_messages(vec![Message::user("motion")])
            .apply(&message(Speaker::Moderator, "welcome"));
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, MessageRole::User);
    }
}
