//! Server-Sent Events (SSE) parser for upstream streaming responses
//!
//! The upstream API streams chunks as:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//!
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//!
//! data: [DONE]
//! ```
//!
//! This parser buffers incoming bytes, scans for event boundaries
//! (double newline), parses each `data:` payload as a chunk, and skips
//! the `[DONE]` sentinel (the stream ends when the connection closes).

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use crate::connector::ConnectorError;

use super::types::ChatCompletionChunk;

/// Parse a stream of bytes as chat completion chunks
pub fn parse_sse_stream(
    byte_stream: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
) -> Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, ConnectorError>> + Send>> {
    let mut buffer = String::new();

    let chunk_stream = byte_stream.flat_map(move |chunk_result| {
        let chunk = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                return futures::stream::iter(vec![Err(ConnectorError::Stream(e.to_string()))]);
            }
        };

        let text = match std::str::from_utf8(&chunk) {
            Ok(t) => t,
            Err(e) => {
                return futures::stream::iter(vec![Err(ConnectorError::Stream(format!(
                    "Invalid UTF-8 in stream: {}",
                    e
                )))]);
            }
        };

        buffer.push_str(text);

        // Process complete events (delimited by \n\n)
        let mut chunks = Vec::new();
        while let Some(event_end) = buffer.find("\n\n") {
            let event_text = buffer[..event_end].to_string();
            buffer.drain(..=event_end + 1);

            if let Some(parsed) = parse_event(&event_text) {
                chunks.push(parsed);
            }
        }

        futures::stream::iter(chunks)
    });

    Box::pin(chunk_stream)
}

/// Parse a single SSE event; returns None for keep-alive comments and the
/// `[DONE]` sentinel
fn parse_event(event_text: &str) -> Option<Result<ChatCompletionChunk, ConnectorError>> {
    let mut data: Option<String> = None;

    for line in event_text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(data_val) = line.strip_prefix("data:") {
            data = Some(data_val.trim().to_string());
        }
    }

    let data = data?;
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<ChatCompletionChunk>(&data) {
        Ok(chunk) => Some(Ok(chunk)),
        Err(e) => Some(Err(ConnectorError::Serialization(format!(
            "Failed to parse upstream SSE chunk: {}. Data: {}",
            e, data
        )))),
    }
}
