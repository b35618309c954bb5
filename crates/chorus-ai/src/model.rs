//! Model-calling capability and the chunk shapes it streams.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{AiError, Message};

/// Stream of raw chunks produced by one model call.
pub type ChunkStream = BoxStream<'static, Result<ModelChunk, AiError>>;

/// A handle that can stream a completion for a prompt.
///
/// Implementations must stop producing chunks once `cancel` fires; yielding
/// `Err(AiError::Aborted)` at that point is allowed.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model name this handle was configured with.
    fn model_name(&self) -> &str;

    async fn stream(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, AiError>;
}

/// One streamed fragment from a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelChunk {
    #[serde(default)]
    pub content: ChunkContent,
    /// Reasoning text emitted by reasoning models alongside the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl ModelChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: ChunkContent::Text(text.into()),
            reasoning: None,
        }
    }

    pub fn blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            content: ChunkContent::Blocks(blocks),
            reasoning: None,
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            content: ChunkContent::default(),
            reasoning: Some(text.into()),
        }
    }
}

/// Content of a chunk as providers send it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
    Other(serde_json::Value),
}

impl Default for ChunkContent {
    fn default() -> Self {
        ChunkContent::Text(String::new())
    }
}

/// One entry of a block-list chunk. Only blocks with `text` contribute content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Text carried by a chunk's content.
///
/// - `Text`: the string itself.
/// - `Blocks`: the `text` of every block that has one, concatenated in order;
///   blocks without text are skipped.
/// - anything else: empty.
pub fn extract_text(content: &ChunkContent) -> String {
    match content {
        ChunkContent::Text(text) => text.clone(),
        ChunkContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect(),
        ChunkContent::Other(_) => String::new(),
    }
}
