//! Defaults applied to new sessions when the caller leaves a field unset.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    /// Provider id used when a session does not name one.
    pub provider: String,
    pub system_prompt: String,
    /// Sampling temperature (valid range: 0.0-2.0).
    pub temperature: f64,
    /// Completion token limit. `0` means unlimited.
    pub max_tokens: u32,
    /// History cap per session (valid range: 2-10000).
    pub max_history_messages: u32,
    /// Buffer size of the lifecycle and window broadcast channels (valid range: 16-65536).
    pub event_capacity: u32,
}

impl SessionDefaults {
    /// The configured token limit, with `0` mapped to "no limit".
    pub fn max_tokens(&self) -> Option<u32> {
        (self.max_tokens > 0).then_some(self.max_tokens)
    }
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            temperature: 0.7,
            max_tokens: 0,
            max_history_messages: 50,
            event_capacity: 256,
        }
    }
}
