//! Line-oriented stream normalization.
//!
//! Vendors frame incremental output differently (SSE `data:` lines, bare
//! newline-delimited JSON). Each adapter supplies a decoder that turns one line
//! into fragments; [`fragment_stream`] drives that decoder lazily over the HTTP
//! body so nothing is read from the network until the caller pulls.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;

use super::types::{FragmentStream, ProviderId};
use crate::error::ClientError;

/// Max line buffer size (1MB) to prevent OOM from malformed streams
const MAX_BUFFER_SIZE: usize = 1_048_576;

/// SSE data prefix, stripped verbatim
pub const DATA_PREFIX: &str = "data: ";

/// Completion sentinel used by OpenAI-style streams
pub const DONE_SENTINEL: &str = "[DONE]";

/// What a single line contributed
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Fragments to emit, in order
    Emit(Vec<String>),
    /// Nothing usable (keep-alive, unrelated event, unparsable JSON)
    Skip,
    /// Completion marker; end the sequence
    Finish,
}

impl LineOutcome {
    fn single(text: Option<&str>) -> Self {
        match text {
            Some(t) if !t.is_empty() => LineOutcome::Emit(vec![t.to_string()]),
            _ => LineOutcome::Skip,
        }
    }
}

struct State<S, F> {
    bytes: Pin<Box<S>>,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    decode: F,
    provider: ProviderId,
    exhausted: bool,
    finished: bool,
}

/// Turn a byte stream into a lazy fragment stream.
///
/// Lines are split on `\n` (a trailing `\r` is dropped) and blank lines are
/// ignored. Bytes are buffered raw and only decoded as UTF-8 at line
/// boundaries, so multi-byte characters split across chunks survive. A read
/// error is yielded once and ends the stream; fragments already produced stay
/// delivered. Dropping the returned stream drops the underlying body.
pub fn fragment_stream<S, E, F>(bytes: S, provider: ProviderId, decode: F) -> FragmentStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
    F: FnMut(&str) -> LineOutcome + Send + 'static,
{
    let state = State {
        bytes: Box::pin(bytes),
        buffer: Vec::new(),
        pending: VecDeque::new(),
        decode,
        provider,
        exhausted: false,
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.pending.pop_front() {
                return Some((Ok(fragment), state));
            }
            if state.finished {
                return None;
            }

            if let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                state.process_line(&line[..line.len() - 1]);
                continue;
            }

            // Only the unterminated remainder counts against the cap
            if state.buffer.len() > MAX_BUFFER_SIZE {
                state.finished = true;
                state.pending.clear();
                let err = ClientError::Stream {
                    provider: state.provider,
                    reason: format!("line exceeded {MAX_BUFFER_SIZE} bytes"),
                };
                return Some((Err(err), state));
            }

            if state.exhausted {
                // Trailing line without a newline
                let rest = std::mem::take(&mut state.buffer);
                state.process_line(&rest);
                state.finished = true;
                continue;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    state.finished = true;
                    let err: ClientError = e.into();
                    return Some((Err(err), state));
                }
                None => state.exhausted = true,
            }
        }
    }))
}

impl<S, F> State<S, F>
where
    F: FnMut(&str) -> LineOutcome,
{
    fn process_line(&mut self, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            return;
        }
        match (self.decode)(line) {
            LineOutcome::Emit(fragments) => self
                .pending
                .extend(fragments.into_iter().filter(|f| !f.is_empty())),
            LineOutcome::Skip => {
                tracing::trace!(provider = %self.provider, line, "skipping stream line");
            }
            LineOutcome::Finish => {
                self.finished = true;
                self.buffer.clear();
            }
        }
    }
}

/// Strip the SSE data prefix. Lines without it (event names, comments) yield None.
pub fn sse_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}

/// Parse a JSON payload, treating failure as "nothing here"
pub fn parse_json(payload: &str) -> Option<Value> {
    serde_json::from_str(payload.trim()).ok()
}

// --- Per-vendor line decoders ---

/// `data: {"choices":[{"delta":{"content":"..."}}]}`, terminated by `data: [DONE]`
pub fn decode_openai_line(line: &str) -> LineOutcome {
    let Some(payload) = sse_payload(line) else {
        return LineOutcome::Skip;
    };
    if payload == DONE_SENTINEL {
        return LineOutcome::Finish;
    }
    let Some(event) = parse_json(payload) else {
        return LineOutcome::Skip;
    };
    LineOutcome::single(event["choices"][0]["delta"]["content"].as_str())
}

/// Anthropic SSE: text arrives in `content_block_delta` events
pub fn decode_anthropic_line(line: &str) -> LineOutcome {
    let Some(payload) = sse_payload(line) else {
        return LineOutcome::Skip;
    };
    if payload == DONE_SENTINEL {
        return LineOutcome::Finish;
    }
    let Some(event) = parse_json(payload) else {
        return LineOutcome::Skip;
    };
    match event["type"].as_str() {
        Some("content_block_delta") => LineOutcome::single(event["delta"]["text"].as_str()),
        Some("message_stop") => LineOutcome::Finish,
        _ => LineOutcome::Skip,
    }
}

/// One JSON object per line; every text part of the first candidate is a fragment
pub fn decode_gemini_line(line: &str) -> LineOutcome {
    let payload = sse_payload(line).unwrap_or(line);
    let Some(event) = parse_json(payload) else {
        return LineOutcome::Skip;
    };
    let Some(parts) = event["candidates"][0]["content"]["parts"].as_array() else {
        return LineOutcome::Skip;
    };
    let fragments: Vec<String> = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .map(str::to_string)
        .collect();
    if fragments.is_empty() {
        LineOutcome::Skip
    } else {
        LineOutcome::Emit(fragments)
    }
}

/// Newline-delimited JSON; any line with a `text` field is a fragment
pub fn decode_cohere_line(line: &str) -> LineOutcome {
    let Some(event) = parse_json(line) else {
        return LineOutcome::Skip;
    };
    LineOutcome::single(event["text"].as_str())
}
