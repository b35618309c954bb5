//! chorus configuration system.
//!
//! Provides TOML-based configuration for provider credentials, session
//! defaults, and logging. All config sections use defaults so partial
//! configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chorus_config::{load_config, SettingsStore};
//!
//! let config = load_config().expect("failed to load config");
//! let openai = config.get_settings("openai");
//! println!("{openai:?}");
//! ```

pub mod schema;
pub mod settings;
pub mod toml_loader;
pub mod toml_writer;
pub mod validation;

pub use schema::{ChorusConfig, LogLevel, ProviderEntry, SessionDefaults, CONFIG_SCHEMA_VERSION};
pub use settings::{MemorySettings, ProviderSettings, SettingsStore};
pub use toml_writer::{save_config, save_config_to_path};

use std::path::Path;

use chorus_common::ConfigError;

/// Load config from the platform default path, creating it if missing.
///
/// Values that fail validation are logged and kept as parsed.
pub fn load_config() -> Result<ChorusConfig, ConfigError> {
    toml_loader::load_default()
}

/// Load config from an explicit path, creating it if missing.
///
/// Values that fail validation are logged and kept as parsed.
pub fn load_config_from(path: &Path) -> Result<ChorusConfig, ConfigError> {
    toml_loader::load_or_create(path)
}

/// Serialize a config to a pretty-printed JSON string with credentials removed.
pub fn config_to_json(config: &ChorusConfig) -> String {
    let mut redacted = config.clone();
    for entry in redacted.providers.values_mut() {
        if !entry.api_key.is_empty() {
            entry.api_key = "[REDACTED]".into();
        }
    }
    serde_json::to_string_pretty(&redacted)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
