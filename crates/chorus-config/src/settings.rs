//! Settings-store capability consumed by provider resolution.
//!
//! Resolution asks for the stored credential and selected model of one
//! provider id at a time. The loaded [`ChorusConfig`] is the production
//! store; [`MemorySettings`] backs tests and embedders that keep
//! credentials elsewhere.

use std::collections::HashMap;
use std::fmt;

use crate::schema::ChorusConfig;

/// Stored settings for one provider.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    pub credential: Option<String>,
    pub selected_model: Option<String>,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("selected_model", &self.selected_model)
            .finish()
    }
}

pub trait SettingsStore: Send + Sync {
    /// Settings stored for `provider_id`, or `None` if nothing is configured.
    fn get_settings(&self, provider_id: &str) -> Option<ProviderSettings>;
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl SettingsStore for ChorusConfig {
    fn get_settings(&self, provider_id: &str) -> Option<ProviderSettings> {
        let entry = self.providers.get(provider_id)?;
        Some(ProviderSettings {
            credential: non_empty(&entry.api_key),
            selected_model: non_empty(&entry.model),
        })
    }
}

/// In-memory settings keyed by provider id.
#[derive(Debug, Default)]
pub struct MemorySettings {
    entries: HashMap<String, ProviderSettings>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(
        mut self,
        provider_id: impl Into<String>,
        credential: Option<&str>,
        selected_model: Option<&str>,
    ) -> Self {
        self.entries.insert(
            provider_id.into(),
            ProviderSettings {
                credential: credential.map(String::from),
                selected_model: selected_model.map(String::from),
            },
        );
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get_settings(&self, provider_id: &str) -> Option<ProviderSettings> {
        self.entries.get(provider_id).cloned()
    }
}
