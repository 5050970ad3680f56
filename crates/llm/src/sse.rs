//! Incremental decoder for server-sent chat completion chunks

use futures::stream::{self, Stream, StreamExt};
use llmassist_common::{AssistError, Result};
use std::fmt::Display;

use crate::llm_trait::ChunkStream;
use crate::types::CompletionChunk;

/// End-of-stream marker sent as the last `data:` frame
const DONE_MARKER: &str = "[DONE]";

/// Decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Content delta
    Delta(String),
    /// Provider signalled completion
    Done,
}

/// Line-buffering SSE decoder
///
/// Network chunks may split a line (or a UTF-8 sequence) anywhere, so bytes
/// are held until a newline arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every frame completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<SseFrame>> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = Self::decode_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush a trailing line that was not newline terminated
    pub fn finish(&mut self) -> Vec<Result<SseFrame>> {
        let line = std::mem::take(&mut self.buffer);
        Self::decode_line(&line).into_iter().collect()
    }

    fn decode_line(raw: &[u8]) -> Option<Result<SseFrame>> {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim_end_matches(['\r', '\n']),
            Err(e) => {
                return Some(Err(AssistError::serialization(format!(
                    "stream line is not UTF-8: {}",
                    e
                ))))
            }
        };

        // Blank separators, comments/keepalives, and event/id/retry fields
        let data = line.strip_prefix("data:")?;
        let data = data.strip_prefix(' ').unwrap_or(data);

        if data.trim() == DONE_MARKER {
            return Some(Ok(SseFrame::Done));
        }

        let chunk: CompletionChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                return Some(Err(AssistError::serialization(format!(
                    "malformed completion chunk: {}",
                    e
                ))))
            }
        };

        if let Some(error) = chunk.error {
            return Some(Err(AssistError::llm(error.message)));
        }

        chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(|content| Ok(SseFrame::Delta(content)))
    }
}

/// Turn a raw response body into a stream of content deltas
///
/// Ends at `[DONE]` or when the body ends.
pub fn decode_body<S, B, E>(body: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    body.map(Some)
        .chain(stream::once(async { None }))
        .scan(SseDecoder::new(), |decoder, item| {
            let frames = match item {
                Some(Ok(bytes)) => decoder.push(bytes.as_ref()),
                Some(Err(e)) => vec![Err(AssistError::stream(format!(
                    "failed to read completion stream: {}",
                    e
                )))],
                None => decoder.finish(),
            };
            futures::future::ready(Some(stream::iter(frames)))
        })
        .flatten()
        .take_while(|frame| futures::future::ready(!matches!(frame, Ok(SseFrame::Done))))
        .filter_map(|frame| {
            futures::future::ready(match frame {
                Ok(SseFrame::Delta(text)) => Some(Ok(text)),
                Ok(SseFrame::Done) => None,
                Err(e) => Some(Err(e)),
            })
        })
        .boxed()
}
