//! Execution-graph capability.
//!
//! A session may carry a [`GraphFactory`]. When present, each run builds a
//! graph around the configured model handle and streams the graph's message
//! chunks instead of calling the model directly.

use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::model::{ChatModel, ModelChunk};
use crate::{AiError, Message};

/// What a graph stream yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Per-message chunks produced by model nodes.
    Messages,
}

/// Item yielded by a graph in [`StreamMode::Messages`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphItem {
    Chunk(ModelChunk),
    /// Chunk paired with node metadata.
    WithMetadata(ModelChunk, serde_json::Value),
}

impl GraphItem {
    pub fn into_chunk(self) -> ModelChunk {
        match self {
            GraphItem::Chunk(chunk) | GraphItem::WithMetadata(chunk, _) => chunk,
        }
    }
}

pub type GraphStream = BoxStream<'static, Result<GraphItem, AiError>>;

/// A compiled execution graph.
#[async_trait]
pub trait ExecutionGraph: Send + Sync {
    async fn stream(
        &self,
        initial_state: Vec<Message>,
        mode: StreamMode,
        cancel: CancellationToken,
    ) -> Result<GraphStream, AiError>;
}

/// Builds a graph around an already-configured streaming model handle.
pub trait GraphFactory: Send + Sync {
    fn build_graph(&self, model: Arc<dyn ChatModel>) -> Result<Box<dyn ExecutionGraph>, AiError>;
}

/// A graph with one model node that answers the initial messages.
///
/// Items are tagged with `{"node": <name>}` metadata.
pub struct SingleNodeGraph {
    node: String,
    model: Arc<dyn ChatModel>,
}

impl SingleNodeGraph {
    pub fn new(node: impl Into<String>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            node: node.into(),
            model,
        }
    }

    /// Factory that wraps every model in a `SingleNodeGraph` named `node`.
    pub fn factory(node: impl Into<String>) -> Arc<dyn GraphFactory> {
        Arc::new(SingleNodeFactory { node: node.into() })
    }
}

#[async_trait]
impl ExecutionGraph for SingleNodeGraph {
    async fn stream(
        &self,
        initial_state: Vec<Message>,
        mode: StreamMode,
        cancel: CancellationToken,
    ) -> Result<GraphStream, AiError> {
        let StreamMode::Messages = mode;
        let mut chunks = self.model.stream(initial_state, cancel).await?;
        let metadata = serde_json::json!({ "node": self.node });
        Ok(Box::pin(stream! {
            while let Some(item) = chunks.next().await {
                yield item.map(|chunk| GraphItem::WithMetadata(chunk, metadata.clone()));
            }
        }))
    }
}

struct SingleNodeFactory {
    node: String,
}

impl GraphFactory for SingleNodeFactory {
    fn build_graph(&self, model: Arc<dyn ChatModel>) -> Result<Box<dyn ExecutionGraph>, AiError> {
        Ok(Box::new(SingleNodeGraph::new(self.node.clone(), model)))
    }
}
