//! Conversation engine for chorus.
//!
//! Runs many independent, cancellable, token-streaming conversations at once:
//! - Provider resolution and model handle construction
//! - A streaming executor that drives a plain model call or an execution graph
//!   and normalizes both into [`StreamEvent`]s
//! - Bounded per-session history
//! - A run orchestrator with pull (stream) and push (window channel) delivery

pub mod event;
pub mod executor;
pub mod graph;
pub mod model;
pub mod openai;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod streaming;

#[cfg(test)]
pub(crate) mod testing;

pub use event::{ErrorKind, StreamEvent};
pub use executor::{ExecutorParams, StreamingExecutor};
pub use graph::{ExecutionGraph, GraphFactory, GraphItem, SingleNodeGraph, StreamMode};
pub use model::{extract_text, ChatModel, ChunkContent, ChunkStream, ContentBlock, ModelChunk};
pub use openai::{OpenAiCompatClient, OpenAiCompatFactory};
pub use orchestrator::{
    ChannelSink, EventSink, Orchestrator, OrchestratorError, OrchestratorStatus, RunCancel,
    RunInfo, RunRequest, StartOptions, Target, WindowMessage, STREAM_CHANNEL,
};
pub use provider::{
    Environment, MapEnv, ModelFactory, ModelParams, ModelRequest, ProcessEnv, ProviderResolver,
    ResolvedProvider,
};
pub use session::{
    HistoryMessage, HistoryRole, Session, SessionConfig, SessionOptions, SessionRegistry,
    SessionSnapshot,
};

/// A message in the prompt sent to a model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
    Assistant,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AiError {
    #[error(
        "No API key configured for provider '{provider_id}'. \
         Add api_key under [providers.{provider_id}] in config.toml or set {env_var}."
    )]
    NoCredential { provider_id: String, env_var: String },
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Unauthorized (401): {0}")]
    Unauthorized(String),
    #[error("Rate limited (429)")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
    #[error("Request aborted")]
    Aborted,
    #[error("Graph error: {0}")]
    Graph(String),
}
