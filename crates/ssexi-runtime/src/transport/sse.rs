//! # SSE decoder
//!
//! Turns a chunked `text/event-stream` body into one string per event:
//! - Line buffering across chunk boundaries (`\n` or `\r\n`)
//! - `data:` lines of one event joined with `\n`
//! - Comments and `event:`/`id:`/`retry:` fields ignored
//! - Events with no data skipped
//! - Invalid UTF-8 replaced with U+FFFD rather than dropping the line
//!
//! A read error is yielded once and ends the stream. An unterminated event
//! at the end of the body is discarded.

use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio_stream::StreamExt;

struct DecoderState<S> {
    stream: S,
    buffer: BytesMut,
    data: Option<String>,
    done: bool,
}

/// Decode SSE events from a byte stream.
pub fn parse_sse_events<S, E>(byte_stream: S) -> impl Stream<Item = Result<String, E>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Send + 'static,
{
    let state = DecoderState {
        stream: byte_stream,
        buffer: BytesMut::with_capacity(8192),
        data: None,
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }

        loop {
            if let Some(newline_pos) = state.buffer.iter().position(|&b| b == b'\n') {
                let mut line_bytes = state.buffer.split_to(newline_pos + 1);
                line_bytes.truncate(line_bytes.len() - 1);
                if line_bytes.last() == Some(&b'\r') {
                    line_bytes.truncate(line_bytes.len() - 1);
                }

                let line = String::from_utf8_lossy(&line_bytes);
                let line: &str = &line;

                if line.is_empty() {
                    if let Some(data) = state.data.take() {
                        if !data.is_empty() {
                            return Some((Ok(data), state));
                        }
                    }
                    continue;
                }

                if let Some(value) = extract_data_field(line) {
                    match state.data.as_mut() {
                        Some(data) => {
                            data.push('\n');
                            data.push_str(value);
                        }
                        None => state.data = Some(value.to_string()),
                    }
                }
                continue;
            }

            match state.stream.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => return None,
            }
        }
    })
}

/// Value of a `data` field line, `None` for any other line.
fn extract_data_field(line: &str) -> Option<&str> {
    if line.starts_with(':') {
        return None;
    }
    let (field, value) = match line.split_once(':') {
        Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    };
    (field == "data").then_some(value)
}
