//! Scripted backends shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::model::{ChatModel, ChunkStream, ModelChunk};
use crate::provider::{ModelFactory, ModelRequest};
use crate::{AiError, Message};

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Chunk(ModelChunk),
    Fail(AiError),
    Sleep(Duration),
    /// Park until cancelled, then report an abort.
    Hang,
}

/// A model that replays a fixed script for every call.
pub(crate) struct ScriptedModel {
    name: String,
    steps: Vec<Step>,
    open_error: Option<AiError>,
    prompts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            name: "scripted".into(),
            steps,
            open_error: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn chunks(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|t| Step::Chunk(ModelChunk::text(*t)))
                .collect(),
        )
    }

    /// Fail when the stream is opened, before any chunk.
    pub(crate) fn failing(err: AiError) -> Self {
        let mut model = Self::new(Vec::new());
        model.open_error = Some(err);
        model
    }

    pub(crate) fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn stream(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, AiError> {
        self.prompts.lock().push(messages);
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        let steps = self.steps.clone();
        Ok(Box::pin(stream! {
            for step in steps {
                match step {
                    Step::Chunk(chunk) => yield Ok(chunk),
                    Step::Fail(err) => {
                        yield Err(err);
                        return;
                    }
                    Step::Sleep(duration) => tokio::time::sleep(duration).await,
                    Step::Hang => {
                        cancel.cancelled().await;
                        yield Err(AiError::Aborted);
                        return;
                    }
                }
            }
        }))
    }
}

/// Factory handing out one shared [`ScriptedModel`] and recording requests.
pub(crate) struct ScriptedFactory {
    model: Arc<ScriptedModel>,
    requests: Mutex<Vec<ModelRequest>>,
    builds: AtomicUsize,
}

impl ScriptedFactory {
    pub(crate) fn new(model: ScriptedModel) -> Arc<Self> {
        Arc::new(Self {
            model: Arc::new(model),
            requests: Mutex::new(Vec::new()),
            builds: AtomicUsize::new(0),
        })
    }

    pub(crate) fn model(&self) -> &Arc<ScriptedModel> {
        &self.model
    }

    pub(crate) fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ModelFactory for ScriptedFactory {
    fn build(&self, request: &ModelRequest) -> Result<Arc<dyn ChatModel>, AiError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        let model: Arc<dyn ChatModel> = self.model.clone();
        Ok(model)
    }
}
