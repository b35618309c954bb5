//! Provider resolution: which provider, credential, and model a run uses.
//!
//! Order of precedence:
//! - provider id: override, then [`DEFAULT_PROVIDER`]
//! - credential: stored settings, then `<ID>_API_KEY`
//! - model: override, stored settings, `<ID>_MODEL`, then [`DEFAULT_MODEL`]
//!
//! The placeholder shipped in the config template counts as "no credential".

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chorus_config::SettingsStore;
use tracing::debug;

use crate::AiError;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const PLACEHOLDER_CREDENTIAL: &str = "your-api-key-here";

/// Source of environment variables.
pub trait Environment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Default, Clone)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl Environment for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// `OPENAI_API_KEY` for `openai`, `OPEN_ROUTER_API_KEY` for `open-router`.
pub fn credential_env_var(provider_id: &str) -> String {
    format!("{}_API_KEY", env_prefix(provider_id))
}

/// `OPENAI_MODEL` for `openai`.
pub fn model_env_var(provider_id: &str) -> String {
    format!("{}_MODEL", env_prefix(provider_id))
}

fn env_prefix(provider_id: &str) -> String {
    provider_id
        .chars()
        .map(|c| match c {
            '-' | '.' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// A provider ready to build a model handle for.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub provider_id: String,
    pub model_name: String,
    pub credential: String,
}

impl fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("provider_id", &self.provider_id)
            .field("model_name", &self.model_name)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

pub struct ProviderResolver {
    settings: Arc<dyn SettingsStore>,
    env: Arc<dyn Environment>,
}

impl ProviderResolver {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            env: Arc::new(ProcessEnv),
        }
    }

    pub fn with_environment(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    /// Resolve the provider for a run. Empty overrides count as absent.
    pub fn resolve(
        &self,
        provider_override: Option<&str>,
        model_override: Option<&str>,
    ) -> Result<ResolvedProvider, AiError> {
        let provider_id = present(provider_override).unwrap_or(DEFAULT_PROVIDER);
        let stored = self.settings.get_settings(provider_id).unwrap_or_default();

        let credential = stored
            .credential
            .filter(|c| usable_credential(c))
            .or_else(|| {
                self.env
                    .var(&credential_env_var(provider_id))
                    .filter(|c| usable_credential(c))
            })
            .ok_or_else(|| AiError::NoCredential {
                provider_id: provider_id.to_string(),
                env_var: credential_env_var(provider_id),
            })?;

        let model_name = present(model_override)
            .map(String::from)
            .or_else(|| stored.selected_model.filter(|m| !m.trim().is_empty()))
            .or_else(|| {
                self.env
                    .var(&model_env_var(provider_id))
                    .filter(|m| !m.trim().is_empty())
            })
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        debug!(provider = provider_id, model = %model_name, "resolved provider");

        Ok(ResolvedProvider {
            provider_id: provider_id.to_string(),
            model_name,
            credential: credential.trim().to_string(),
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn usable_credential(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != PLACEHOLDER_CREDENTIAL
}
