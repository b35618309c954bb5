//! Full configuration validation.
//!
//! Collects every violation into a single `ConfigError` so the user sees
//! all problems at once.

mod helpers;


use crate::schema::ChorusConfig;
use chorus_common::ConfigError;

use helpers::{validate_range, validate_range_f64};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ChorusConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_defaults(&mut errors, config);
    validate_providers(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_defaults(errors: &mut Vec<String>, config: &ChorusConfig) {
    let defaults = &config.defaults;
    if defaults.provider.trim().is_empty() {
        errors.push("defaults.provider must not be empty".into());
    }
    validate_range_f64(
        errors,
        "defaults.temperature",
        defaults.temperature,
        0.0,
        2.0,
    );
    validate_range(
        errors,
        "defaults.max_history_messages",
        defaults.max_history_messages,
        2,
        10_000,
    );
    validate_range(
        errors,
        "defaults.event_capacity",
        defaults.event_capacity,
        16,
        65_536,
    );
}

fn validate_providers(errors: &mut Vec<String>, config: &ChorusConfig) {
    for id in config.providers.keys() {
        if id.trim().is_empty() || id.chars().any(char::is_whitespace) {
            errors.push(format!("providers.{id:?} is not a valid provider id"));
        }
    }
}
