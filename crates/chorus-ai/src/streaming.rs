//! Server-Sent Events (SSE) streaming parser.
//!
//! OpenAI-compatible chat-completion endpoints stream their deltas as SSE.
//! The parser is pull-based: each event is read from the body only when the
//! consumer asks for the next one, so dropping the stream stops reading.

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::io::StreamReader;

use crate::AiError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, if the server sent an `event:` field.
    pub event: Option<String>,
    /// The event data (joined with `\n` when split across `data:` lines).
    pub data: String,
}

/// Parse the SSE body of a reqwest response.
pub fn sse_events(
    response: reqwest::Response,
) -> impl Stream<Item = Result<SseEvent, AiError>> + Send + 'static {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    parse_sse(tokio::io::BufReader::new(StreamReader::new(byte_stream)))
}

/// Parse SSE events from any buffered reader.
pub fn parse_sse<R>(reader: R) -> impl Stream<Item = Result<SseEvent, AiError>> + Send + 'static
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    stream! {
        let mut lines = reader.lines();
        let mut current_event: Option<String> = None;
        let mut current_data = String::new();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    yield Err(AiError::NetworkError(e.to_string()));
                    return;
                }
            };
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if line.is_empty() {
                // Empty line = end of event
                if !current_data.is_empty() {
                    yield Ok(SseEvent {
                        event: current_event.take(),
                        data: std::mem::take(&mut current_data),
                    });
                }
                current_event = None;
                continue;
            }

            if let Some(event_type) = field_value(line, "event") {
                current_event = Some(event_type.to_string());
            } else if let Some(data) = field_value(line, "data") {
                if !current_data.is_empty() {
                    current_data.push('\n');
                }
                current_data.push_str(data);
            }
            // id:, retry: and comment lines carry nothing we use
        }

        if !current_data.is_empty() {
            yield Ok(SseEvent {
                event: current_event,
                data: current_data,
            });
        }
    }
}

/// Value of `name:` in an SSE line, with the single optional leading space removed.
fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}
