//! Client struct, request building, and delta parsing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::model::{ChatModel, ChunkContent, ModelChunk};
use crate::provider::{ModelFactory, ModelParams, ModelRequest};
use crate::{AiError, Message, Role};

/// A handle to one model on one OpenAI-compatible endpoint.
pub struct OpenAiCompatClient {
    pub(crate) params: ModelParams,
    pub(crate) credential: String,
    pub(crate) http: reqwest::Client,
}

impl fmt::Debug for OpenAiCompatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatClient")
            .field("params", &self.params)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest silence allowed between two reads of a response. Replies may
/// stream for longer than this in total.
const READ_TIMEOUT: Duration = Duration::from_secs(120);

impl OpenAiCompatClient {
    pub fn new(params: ModelParams, credential: impl Into<String>) -> Result<Self, AiError> {
        Self::with_read_timeout(params, credential, READ_TIMEOUT)
    }

    pub(crate) fn with_read_timeout(
        params: ModelParams,
        credential: impl Into<String>,
        read_timeout: Duration,
    ) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(read_timeout)
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            params,
            credential: credential.into(),
            http,
        })
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.params.base_url.trim_end_matches('/'))
    }

    /// Build the JSON request body for the chat-completions API.
    pub(crate) fn build_request_body(&self, messages: &[Message]) -> serde_json::Value {
        let msgs: Vec<_> = messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::System => "system",
                    Role::Human => "user",
                    Role::Assistant => "assistant",
                };
                serde_json::json!({ "role": role, "content": msg.content })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.params.model,
            "messages": msgs,
            "stream": self.params.streaming,
        });

        if let Some(temperature) = self.params.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(limit) = self.params.max_tokens {
            // Reasoning models only accept the newer field name.
            let field = if self.params.reasoning {
                "max_completion_tokens"
            } else {
                "max_tokens"
            };
            body[field] = serde_json::json!(limit);
        }

        body
    }
}

/// Parse one streamed `data:` payload.
///
/// Returns `Ok(None)` for frames that carry no delta (role-only openers,
/// usage trailers, empty choice lists).
pub(crate) fn parse_chunk(data: &str) -> Result<Option<ModelChunk>, AiError> {
    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|e| AiError::ParseError(e.to_string()))?;

    if let Some(err) = json.get("error") {
        let message = err["message"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| err.to_string());
        return Err(AiError::ApiError(message));
    }

    let delta = &json["choices"][0]["delta"];
    if delta.is_null() {
        return Ok(None);
    }
    Ok(chunk_from(delta))
}

/// Parse a non-streaming completion body into a single chunk.
pub(crate) fn parse_completion(json: &serde_json::Value) -> Result<ModelChunk, AiError> {
    if let Some(err) = json.get("error") {
        return Err(AiError::ApiError(err.to_string()));
    }
    let message = &json["choices"][0]["message"];
    if message.is_null() {
        return Err(AiError::ParseError("response has no choices".into()));
    }
    Ok(chunk_from(message).unwrap_or_default())
}

fn chunk_from(value: &serde_json::Value) -> Option<ModelChunk> {
    let content = match &value["content"] {
        serde_json::Value::Null => None,
        other => serde_json::from_value::<ChunkContent>(other.clone()).ok(),
    };
    let reasoning = value["reasoning_content"]
        .as_str()
        .or_else(|| value["reasoning"].as_str())
        .filter(|r| !r.is_empty())
        .map(String::from);

    if content.is_none() && reasoning.is_none() {
        return None;
    }
    Some(ModelChunk {
        content: content.unwrap_or_default(),
        reasoning,
    })
}

/// Builds [`OpenAiCompatClient`]s. Construction never touches the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiCompatFactory;

impl ModelFactory for OpenAiCompatFactory {
    fn build(&self, request: &ModelRequest) -> Result<Arc<dyn ChatModel>, AiError> {
        let params = ModelParams::from_request(request);
        let client = OpenAiCompatClient::new(params, request.credential.clone())?;
        Ok(Arc::new(client))
    }
}
