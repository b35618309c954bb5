//! ChatModel implementation for OpenAiCompatClient.

use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::{ChatModel, ChunkStream};
use crate::streaming::sse_events;
use crate::{AiError, Message};

use super::client::{parse_chunk, parse_completion, OpenAiCompatClient};

const DONE_SENTINEL: &str = "[DONE]";

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    fn model_name(&self) -> &str {
        &self.params.model
    }

    async fn stream(
        &self,
        messages: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, AiError> {
        let body = self.build_request_body(&messages);

        debug!(
            model = %self.params.model,
            url = %self.completions_url(),
            streaming = self.params.streaming,
            "chat completions request"
        );

        let send = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.credential)
            .header("content-type", "application/json")
            .json(&body)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AiError::Aborted),
            result = send => result.map_err(map_transport_error)?,
        };

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::Unauthorized(truncate(&text)));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError(format!("HTTP {status}: {}", truncate(&text))));
        }

        if !self.params.streaming {
            let json: serde_json::Value = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AiError::Aborted),
                result = response.json() => result.map_err(|e| AiError::ParseError(e.to_string()))?,
            };
            let chunk = parse_completion(&json)?;
            return Ok(Box::pin(futures_util::stream::once(async move { Ok::<_, AiError>(chunk) })));
        }

        let mut events = Box::pin(sse_events(response));
        Ok(Box::pin(stream! {
            loop {
                let polled = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = events.next() => Some(next),
                };
                let Some(next) = polled else {
                    yield Err(AiError::Aborted);
                    return;
                };
                let event = match next {
                    Some(Ok(event)) => event,
                    Some(Err(e)) => {
                        yield Err(e);
                        return;
                    }
                    None => return,
                };
                if event.data.trim() == DONE_SENTINEL {
                    return;
                }
                match parse_chunk(&event.data) {
                    Ok(Some(chunk)) => yield Ok(chunk),
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }))
    }
}

fn map_transport_error(err: reqwest::Error) -> AiError {
    if err.is_timeout() {
        AiError::Timeout
    } else {
        AiError::NetworkError(err.to_string())
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(200).collect()
}
