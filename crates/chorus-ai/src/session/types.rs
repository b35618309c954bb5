//! Session configuration, history entries, and snapshots.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chorus_common::SessionId;
use chorus_config::SessionDefaults;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::GraphFactory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Assistant,
            content: content.into(),
        }
    }
}

/// Caller-supplied options for a new session. Unset fields take defaults.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionOptions {
    pub provider_id: Option<String>,
    pub model_id: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub max_history_messages: Option<u32>,
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(skip)]
    pub graph: Option<Arc<dyn GraphFactory>>,
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("provider_id", &self.provider_id)
            .field("model_id", &self.model_id)
            .field("system_prompt", &self.system_prompt)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_history_messages", &self.max_history_messages)
            .field("metadata", &self.metadata)
            .field("graph", &self.graph.is_some())
            .finish()
    }
}

/// Immutable configuration of a session.
#[derive(Clone)]
pub struct SessionConfig {
    pub provider_id: String,
    /// Empty means resolve at run time.
    pub model_id: String,
    pub system_prompt: String,
    pub temperature: f64,
    /// `None` means unlimited.
    pub max_tokens: Option<u32>,
    pub max_history_messages: usize,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub graph: Option<Arc<dyn GraphFactory>>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("provider_id", &self.provider_id)
            .field("model_id", &self.model_id)
            .field("system_prompt", &self.system_prompt)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_history_messages", &self.max_history_messages)
            .field("metadata", &self.metadata)
            .field("graph", &self.graph.is_some())
            .finish()
    }
}

impl SessionConfig {
    pub fn from_options(options: SessionOptions, defaults: &SessionDefaults) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            provider_id: non_empty(options.provider_id).unwrap_or_else(|| defaults.provider.clone()),
            model_id: options.model_id.unwrap_or_default(),
            system_prompt: non_empty(options.system_prompt)
                .unwrap_or_else(|| defaults.system_prompt.clone()),
            temperature: options.temperature.unwrap_or(defaults.temperature),
            max_tokens: options.max_tokens.or(defaults.max_tokens()).filter(|n| *n > 0),
            // Pairs are trimmed together, so anything below one exchange is useless.
            max_history_messages: options
                .max_history_messages
                .unwrap_or(defaults.max_history_messages)
                .max(2) as usize,
            metadata: options.metadata,
            graph: options.graph,
        }
    }
}

/// Serializable view of a session. The graph factory is never included.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub provider_id: String,
    pub model_id: String,
    pub system_prompt: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub max_history_messages: usize,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub history: Vec<HistoryMessage>,
    pub history_length: usize,
    pub is_active: bool,
    pub active_runs: usize,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}
