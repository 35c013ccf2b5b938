//! Application configuration: OpenRouter access, tool keys, data directory.
//!
//! Defaults come from the environment; a TOML file may override individual
//! fields. Session-level settings (models, rounds, tools) live in
//! `debate::DebateConfig` and come from CLI flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TITLE_MODEL: &str = "google/gemini-2.5-flash";

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OpenRouter API key. Required to run debates.
    pub api_key: String,
    /// Chat-completions base URL.
    pub base_url: String,
    /// Sent as `HTTP-Referer` on every request (OpenRouter attribution).
    pub referer: String,
    /// Sent as `X-Title` on every request.
    pub app_title: String,
    /// Model used for conversation titles.
    pub title_model: String,
    /// Brave Search key; when absent the search tool reports itself disabled.
    pub brave_api_key: Option<String>,
    /// Directory holding one JSON file per conversation.
    pub data_dir: PathBuf,
    /// Per-request HTTP timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            referer: std::env::var("PARLIAMENT_REFERER")
                .unwrap_or_else(|_| "https://github.com/llm-parliament".into()),
            app_title: std::env::var("PARLIAMENT_APP_TITLE")
                .unwrap_or_else(|_| "LLM Parliament".into()),
            title_model: std::env::var("PARLIAMENT_TITLE_MODEL")
                .unwrap_or_else(|_| DEFAULT_TITLE_MODEL.into()),
            brave_api_key: std::env::var("BRAVE_API_KEY").ok().filter(|k| !k.is_empty()),
            data_dir: std::env::var("PARLIAMENT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("conversations")),
            request_timeout_secs: 120,
        }
    }
}

/// Partial overrides read from a TOML file.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    referer: Option<String>,
    app_title: Option<String>,
    title_model: Option<String>,
    brave_api_key: Option<String>,
    data_dir: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Environment defaults, then TOML overrides if a file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let file: FileConfig = toml::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            config.apply(file);
        }
        Ok(config)
    }

    fn apply(&mut self, file: FileConfig) {
        if let Some(v) = file.api_key {
            self.api_key = v;
        }
        if let Some(v) = file.base_url {
            self.base_url = v;
        }
        if let Some(v) = file.referer {
            self.referer = v;
        }
        if let Some(v) = file.app_title {
            self.app_title = v;
        }
        if let Some(v) = file.title_model {
            self.title_model = v;
        }
        if let Some(v) = file.brave_api_key {
            self.brave_api_key = Some(v).filter(|k| !k.is_empty());
        }
        if let Some(v) = file.data_dir {
            self.data_dir = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
    }
}
