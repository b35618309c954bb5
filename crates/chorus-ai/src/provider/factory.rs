//! Model handle construction.

use std::fmt;
use std::sync::Arc;

use crate::model::ChatModel;
use crate::AiError;

use super::endpoints::{base_url_for, is_reasoning_model};

/// Everything needed to build a model handle.
#[derive(Clone, PartialEq)]
pub struct ModelRequest {
    pub provider_id: String,
    pub credential: String,
    pub model_name: String,
    pub streaming: bool,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl fmt::Debug for ModelRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRequest")
            .field("provider_id", &self.provider_id)
            .field("credential", &"[REDACTED]")
            .field("model_name", &self.model_name)
            .field("streaming", &self.streaming)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Parameters a handle is actually configured with, derived from a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub base_url: String,
    pub model: String,
    pub streaming: bool,
    /// `None` for reasoning models, which reject the parameter.
    pub temperature: Option<f64>,
    /// `None` means no limit.
    pub max_tokens: Option<u32>,
    pub reasoning: bool,
}

impl ModelParams {
    pub fn from_request(request: &ModelRequest) -> Self {
        let reasoning = is_reasoning_model(&request.model_name);
        Self {
            base_url: base_url_for(&request.provider_id).to_string(),
            model: request.model_name.clone(),
            streaming: request.streaming,
            temperature: if reasoning { None } else { request.temperature },
            max_tokens: request.max_tokens.filter(|n| *n > 0),
            reasoning,
        }
    }
}

/// Builds model handles. Construction must not touch the network.
pub trait ModelFactory: Send + Sync {
    fn build(&self, request: &ModelRequest) -> Result<Arc<dyn ChatModel>, AiError>;
}
