//! Streaming executor.
//!
//! Turns one prompt into a lazy sequence of [`StreamEvent`]s. Two paths:
//! - linear: call the model handle directly
//! - graph: build an execution graph around the handle and stream its
//!   per-message chunks
//!
//! Both paths extract text the same way, check cancellation before every
//! emission, and convert failures into at most one terminal `Error`.

mod classify;


use std::sync::Arc;

use async_stream::stream;
use chorus_common::RunId;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::event::StreamEvent;
use crate::graph::{GraphFactory, StreamMode};
use crate::model::{extract_text, ChunkStream};
use crate::provider::{ModelFactory, ModelRequest, ResolvedProvider};
use crate::session::{HistoryMessage, HistoryRole};
use crate::{AiError, Message};

use classify::failure_event;

/// Inputs for one run.
pub struct ExecutorParams {
    pub run_id: RunId,
    pub provider: ResolvedProvider,
    pub system_prompt: String,
    pub history: Vec<HistoryMessage>,
    pub input: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Selects the graph path when present.
    pub graph: Option<Arc<dyn GraphFactory>>,
    pub cancel: CancellationToken,
}

pub struct StreamingExecutor {
    factory: Arc<dyn ModelFactory>,
}

impl StreamingExecutor {
    pub fn new(factory: Arc<dyn ModelFactory>) -> Self {
        Self { factory }
    }

    /// Stream the events of one run. Nothing happens until the stream is polled.
    pub fn stream(&self, params: ExecutorParams) -> BoxStream<'static, StreamEvent> {
        let factory = Arc::clone(&self.factory);
        Box::pin(stream! {
            let ExecutorParams {
                run_id,
                provider,
                system_prompt,
                history,
                input,
                temperature,
                max_tokens,
                graph,
                cancel,
            } = params;

            let prompt = build_prompt(&system_prompt, &history, &input);
            let request = ModelRequest {
                provider_id: provider.provider_id,
                credential: provider.credential,
                model_name: provider.model_name,
                streaming: true,
                temperature,
                max_tokens,
            };

            debug!(
                run_id = %run_id,
                provider = %request.provider_id,
                model = %request.model_name,
                graph = graph.is_some(),
                messages = prompt.len(),
                "opening model stream"
            );

            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                opened = open_chunks(factory.as_ref(), &request, graph, prompt, cancel.clone()) => Some(opened),
            };
            let mut chunks = match opened {
                None => return,
                Some(Ok(chunks)) => chunks,
                Some(Err(err)) => {
                    warn!(run_id = %run_id, error = %err, "model stream failed to open");
                    if let Some(event) = failure_event(&run_id, &err, &cancel) {
                        yield event;
                    }
                    return;
                }
            };

            let mut full_content = String::new();
            let mut token_count = 0usize;

            loop {
                let polled = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = chunks.next() => Some(next),
                };
                let Some(next) = polled else {
                    debug!(run_id = %run_id, "stream cancelled");
                    return;
                };
                let chunk = match next {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(err)) => {
                        warn!(run_id = %run_id, error = %err, "model stream failed");
                        if let Some(event) = failure_event(&run_id, &err, &cancel) {
                            yield event;
                        }
                        return;
                    }
                    None => break,
                };

                if let Some(reasoning) = chunk.reasoning.filter(|r| !r.is_empty()) {
                    if cancel.is_cancelled() {
                        return;
                    }
                    yield StreamEvent::Thinking {
                        run_id: run_id.clone(),
                        text: reasoning,
                    };
                }

                let text = extract_text(&chunk.content);
                if text.is_empty() {
                    continue;
                }
                if cancel.is_cancelled() {
                    return;
                }
                full_content.push_str(&text);
                token_count += 1;
                yield StreamEvent::Token {
                    run_id: run_id.clone(),
                    text,
                };
            }

            if cancel.is_cancelled() {
                return;
            }
            debug!(run_id = %run_id, token_count, "model stream finished");
            yield StreamEvent::Done {
                run_id,
                full_content,
                token_count,
            };
        })
    }
}

/// `[system] + history + [input]`, with user history mapped to human turns.
fn build_prompt(system_prompt: &str, history: &[HistoryMessage], input: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend(history.iter().map(|entry| match entry.role {
        HistoryRole::User => Message::human(entry.content.clone()),
        HistoryRole::Assistant => Message::assistant(entry.content.clone()),
    }));
    messages.push(Message::human(input));
    messages
}

async fn open_chunks(
    factory: &dyn ModelFactory,
    request: &ModelRequest,
    graph: Option<Arc<dyn GraphFactory>>,
    prompt: Vec<Message>,
    cancel: CancellationToken,
) -> Result<ChunkStream, AiError> {
    let model = factory.build(request)?;
    let Some(graph_factory) = graph else {
        return model.stream(prompt, cancel).await;
    };

    let graph = graph_factory.build_graph(model)?;
    let items = graph.stream(prompt, StreamMode::Messages, cancel).await?;
    Ok(Box::pin(items.map(|item| item.map(|item| item.into_chunk()))))
}
