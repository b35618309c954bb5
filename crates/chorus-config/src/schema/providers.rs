//! Per-provider credential and model selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One `[providers.<id>]` table.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderEntry {
    pub api_key: String,
    /// Selected model name. Empty means "use the resolver's fallback".
    pub model: String,
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}
