//! Server-sent events framing for streamed completions.

use std::collections::VecDeque;

use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::decode::ChunkStream;
use crate::error::TransportError;

/// Payload that ends an OpenAI completion stream.
pub const DONE: &str = "[DONE]";

/// Incremental SSE decoder: feed raw body bytes, get back the `data` payload
/// of every event completed so far.
///
/// Lines may be split across chunks at any byte, including inside a UTF-8
/// sequence. `\n` and `\r\n` line endings are accepted; comment lines and
/// fields other than `data` are ignored.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut events = Vec::new();
        for &b in bytes {
            if b == b'\n' {
                let line = std::mem::take(&mut self.line);
                self.process_line(&line, &mut events);
            } else {
                self.line.push(b);
            }
        }
        events
    }

    /// Flush whatever is buffered once the body has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.line.is_empty() {
            let line = std::mem::take(&mut self.line);
            self.process_line(&line, &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn process_line(&mut self, raw: &[u8], events: &mut Vec<String>) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);

        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };
        if field == "data" {
            self.data.push(value.to_owned());
        }
    }

    /// Events whose data is empty or blank are dropped.
    fn dispatch(&mut self, events: &mut Vec<String>) {
        let data = self.data.join("\n");
        self.data.clear();
        if !data.trim().is_empty() {
            events.push(data);
        }
    }
}

#[derive(Deserialize)]
struct ChunkBody {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Text carried by one completion chunk, if any. Role-only and empty deltas
/// give `None`.
pub fn delta_content(data: &str) -> Result<Option<String>, TransportError> {
    let body: ChunkBody = serde_json::from_str(data)?;
    Ok(body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

struct State {
    body: futures::stream::BoxStream<'static, Result<Vec<u8>, TransportError>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a streamed response body into the completion's text deltas.
///
/// The returned stream ends at `[DONE]` or when the body ends, and stops
/// after yielding the first error.
pub fn completion_chunks<S, B, E>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + 'static,
    E: Into<TransportError> + 'static,
{
    let state = State {
        body: body
            .map(|item| item.map(|bytes| bytes.as_ref().to_vec()).map_err(Into::into))
            .boxed(),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.pending.pop_front() {
                if data == DONE {
                    return None;
                }
                match delta_content(&data) {
                    Ok(Some(text)) => return Some((Ok(text), state)),
                    Ok(None) => continue,
                    Err(err) => {
                        state.pending.clear();
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                }
            }

            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => state.pending.extend(state.decoder.feed(&bytes)),
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(err), state));
                }
                None => {
                    state.pending.extend(state.decoder.finish());
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
