//! Per-run request and delivery options.

use chorus_common::WindowId;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::session::HistoryMessage;

/// One prompt submitted against a session. Set fields override the
/// session's configuration for this run only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub prompt: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Replaces the session history for this run. The exchange is then not
    /// recorded in the session.
    #[serde(default)]
    pub messages: Option<Vec<HistoryMessage>>,
}

impl RunRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// Push-mode delivery options.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Deliver to one window; `None` broadcasts.
    pub target_window: Option<WindowId>,
    /// Cancels the run when tripped.
    pub external_cancel: Option<CancellationToken>,
}
