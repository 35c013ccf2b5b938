//! Bounded context window handed to agents.
//!
//! Instead of replaying the whole transcript, every generate call sees the
//! motion, the latest Moderator steering summary, and the last K finalized
//! entries. K is `DebateConfig::context_window`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::protocol::Message;

/// What one speaker sees when asked to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextWindow {
    motion: String,
    /// Latest Moderator steering statement, if any.
    summary: Option<String>,
    limit: usize,
    entries: VecDeque<Message>,
}

impl ContextWindow {
    pub fn new(motion: impl Into<String>, limit: usize) -> Self {
        Self {
            motion: motion.into(),
            summary: None,
            limit: limit.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Record a finalized transcript entry, evicting the oldest beyond K.
    pub fn push(&mut self, message: Message) {
        self.entries.push_back(message);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    /// Replace the running summary with the latest steering statement.
    pub fn set_summary(&mut self, text: impl Into<String>) {
        self.summary = Some(text.into());
    }

    pub fn motion(&self) -> &str {
        &self.motion
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain-text rendering for prompt construction.
    pub fn render(&self) -> String {
        let mut out = format!("Motion: {}\n", self.motion);
        if let Some(summary) = &self.summary {
            out.push_str(&format!("\nModerator's latest steering:\n{summary}\n"));
        }
        if !self.entries.is_empty() {
            out.push_str("\nRecent statements:\n");
            for entry in &self.entries {
                let who = entry
                    .name
                    .map(|s| s.label().to_string())
                    .unwrap_or_else(|| entry.role.to_string());
                out.push_str(&format!("[{who}] {}\n", entry.content));
            }
        }
        out
    }
}
