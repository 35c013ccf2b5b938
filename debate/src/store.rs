//! Conversation persistence.
//!
//! One JSON file per conversation under a data directory. The scheduler
//! persists the user motion and each finalized message as it lands, so a
//! crash mid-session loses at most the in-flight turn.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::protocol::Message;

/// A persisted debate conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            title: None,
            messages: Vec::new(),
        }
    }
}

/// Listing entry: metadata without the message bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message_count: usize,
}

/// Storage boundary for conversations.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError>;
    async fn get(&self, id: &str) -> Result<Conversation, StoreError>;
    /// Newest first. Unreadable entries are skipped, not fatal.
    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError>;
    async fn append_message(&self, id: &str, message: &Message) -> Result<(), StoreError>;
    async fn set_title(&self, id: &str, title: &str) -> Result<(), StoreError>;
}

/// File-backed store: `<data_dir>/<conversation_id>.json`, pretty-printed.
///
/// Writes are serialized through one async mutex per store instance.
pub struct JsonFileStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{id}.json"))
    }

    fn read_conversation(path: &Path) -> Result<Conversation, StoreError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(conversation)?;
        std::fs::write(self.path_for(&conversation.id), json)?;
        Ok(())
    }

    /// Load, mutate, write back under the store lock.
    async fn update<F>(&self, id: &str, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Conversation),
    {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let mut conversation = Self::read_conversation(&path)?;
        mutate(&mut conversation);
        self.write_conversation(&conversation)
    }
}

#[async_trait]
impl ConversationStore for JsonFileStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_conversation(conversation)
    }

    async fn get(&self, id: &str) -> Result<Conversation, StoreError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::read_conversation(&path)
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        let mut summaries = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_conversation(&path) {
                Ok(conversation) => summaries.push(ConversationSummary {
                    id: conversation.id,
                    created_at: conversation.created_at,
                    title: conversation.title,
                    message_count: conversation.messages.len(),
                }),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping unreadable conversation");
                }
            }
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn append_message(&self, id: &str, message: &Message) -> Result<(), StoreError> {
        let message = message.clone();
        self.update(id, move |conversation| {
            conversation.messages.push(message);
        })
        .await
    }

    async fn set_title(&self, id: &str, title: &str) -> Result<(), StoreError> {
        let title = title.to_string();
        self.update(id, move |conversation| {
            conversation.title = Some(title);
        })
        .await
    }
}
