//! Streamed chat response decoding.
//!
//! The chat endpoint replies with one JSON object per line, each carrying an
//! incremental `message.content` fragment and a `done` flag. [`decode_chunks`]
//! turns any byte stream into a lazy stream of [`Fragment`]s and
//! [`assemble`] concatenates them until the first `done = true`.

use std::borrow::Cow;

use bytes::Bytes;
use futures::stream::{self, Stream};
use serde::Deserialize;
use tokio_stream::StreamExt;
use tracing::{debug, error, warn};

use crate::error::{ServiceError, ServiceResult};

/// Longest line accepted before the response is treated as unparseable.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// One line of the streamed chat response.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatChunk {
    pub message: Option<ChunkMessage>,
    pub done: Option<bool>,
    /// In-band error reported by the server instead of a message.
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChunkMessage {
    pub content: Option<String>,
}

/// A decoded piece of generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub content: String,
    pub done: bool,
}

/// Decode a single response line.
///
/// Returns `Ok(None)` for blank lines and for lines that are not a valid
/// chunk; those are logged and skipped. Invalid UTF-8 is replaced with
/// U+FFFD rather than rejected.
pub fn decode_line(line: &[u8]) -> ServiceResult<Option<Fragment>> {
    let text = String::from_utf8_lossy(line);
    if let Cow::Owned(_) = text {
        warn!("Response line contained invalid UTF-8, replacing");
    }

    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let chunk: ChatChunk = match serde_json::from_str(text) {
        Ok(chunk) => chunk,
        Err(e) => {
            error!(line = text, error = %e, "JSON parsing error for line, skipping");
            return Ok(None);
        }
    };

    if let Some(message) = chunk.error {
        error!(error = %message, "Chat endpoint reported an error");
        return Err(ServiceError::UpstreamProtocol(message));
    }

    Ok(Some(Fragment {
        content: chunk
            .message
            .and_then(|m| m.content)
            .unwrap_or_default(),
        done: chunk.done.unwrap_or(false),
    }))
}

/// Splits a byte stream into lines and decodes each into a fragment.
struct LineReader<S> {
    body: S,
    buf: Vec<u8>,
    /// Prefix of `buf` already known to hold no newline.
    scanned: usize,
    exhausted: bool,
}

impl<S, E> LineReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    fn next_line(&mut self) -> Option<Vec<u8>> {
        if let Some(offset) = self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            let pos = self.scanned + offset;
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            self.scanned = 0;
            return Some(line);
        }
        self.scanned = self.buf.len();

        // An unterminated final line still counts once the body has ended.
        if self.exhausted && !self.buf.is_empty() {
            self.scanned = 0;
            return Some(std::mem::take(&mut self.buf));
        }
        None
    }

    fn fail(&mut self) {
        self.exhausted = true;
        self.scanned = 0;
        self.buf.clear();
    }

    async fn next_fragment(&mut self) -> Option<ServiceResult<Fragment>> {
        loop {
            while let Some(line) = self.next_line() {
                match decode_line(&line) {
                    Ok(Some(fragment)) => return Some(Ok(fragment)),
                    Ok(None) => continue,
                    Err(e) => {
                        self.fail();
                        return Some(Err(e));
                    }
                }
            }

            if self.exhausted {
                return None;
            }

            if self.buf.len() > MAX_LINE_BYTES {
                error!(buffered = self.buf.len(), "Response line exceeds size limit");
                self.fail();
                return Some(Err(ServiceError::UpstreamProtocol(format!(
                    "response line exceeds {MAX_LINE_BYTES} bytes"
                ))));
            }

            match self.body.next().await {
                Some(Ok(bytes)) => self.buf.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    error!(error = %e, "Transport error while reading chat response");
                    self.fail();
                    return Some(Err(ServiceError::UpstreamUnavailable(e.to_string())));
                }
                None => self.exhausted = true,
            }
        }
    }
}

/// Lazily decode a newline-delimited JSON body into fragments.
///
/// The body is only polled when the consumer asks for the next fragment,
/// so a consumer that stops early leaves the rest of the body unread. The
/// stream ends after the first error.
pub fn decode_chunks<S, E>(body: S) -> impl Stream<Item = ServiceResult<Fragment>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let reader = LineReader {
        body,
        buf: Vec::new(),
        scanned: 0,
        exhausted: false,
    };

    stream::unfold(reader, |mut reader| async move {
        let item = reader.next_fragment().await?;
        Some((item, reader))
    })
}

/// Concatenate fragments in arrival order up to and including the first
/// one marked `done`, then trim surrounding whitespace.
pub async fn assemble<S>(fragments: S) -> ServiceResult<String>
where
    S: Stream<Item = ServiceResult<Fragment>>,
{
    tokio::pin!(fragments);

    let mut text = String::new();
    let mut count = 0usize;
    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        text.push_str(&fragment.content);
        count += 1;
        if fragment.done {
            debug!(fragments = count, "Completion marker received");
            break;
        }
    }

    Ok(text.trim().to_string())
}
