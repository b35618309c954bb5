//! Configuration schema types for chorus.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod defaults;
mod providers;
mod system;

pub use defaults::*;
pub use providers::*;
pub use system::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for chorus.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChorusConfig {
    pub defaults: SessionDefaults,
    /// Per-provider credentials and model selection, keyed by provider id.
    pub providers: BTreeMap<String, ProviderEntry>,
    pub logging: LoggingConfig,
}

impl ChorusConfig {
    /// Insert or update the entry for `provider_id`.
    ///
    /// `None` leaves the existing field untouched.
    pub fn set_provider(
        &mut self,
        provider_id: &str,
        api_key: Option<String>,
        model: Option<String>,
    ) {
        let entry = self.providers.entry(provider_id.to_string()).or_default();
        if let Some(key) = api_key {
            entry.api_key = key;
        }
        if let Some(model) = model {
            entry.model = model;
        }
    }
}
