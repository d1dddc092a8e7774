//! Server-Sent Events line handling
//!
//! Only the `data:` field matters here. Everything else (comments, `event:`,
//! keep-alives) is skipped, as are payloads that fail to decode.

use super::protocol::ChatCompletionChunk;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// What a single SSE line means for the fragment stream.
#[derive(Debug, PartialEq, Eq)]
pub enum SseLine {
    Fragment(String),
    Done,
    Skip,
}

pub fn parse_line(line: &str) -> SseLine {
    let line = line.trim();
    let Some(data) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Skip;
    };
    if data == DONE_SENTINEL {
        return SseLine::Done;
    }
    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => chunk.into_content().map_or(SseLine::Skip, SseLine::Fragment),
        Err(e) => {
            trace!("Skipping undecodable SSE payload: {}", e);
            SseLine::Skip
        }
    }
}

/// Reassembles lines from arbitrarily split body chunks.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Appends `bytes` and returns every line completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Whatever is left once the body ends without a trailing newline.
    pub fn finish(self) -> Option<String> {
        (!self.pending.is_empty()).then(|| String::from_utf8_lossy(&self.pending).into_owned())
    }
}

/// Forwards content deltas from an SSE body into `tx`.
///
/// Returns when the body ends, `[DONE]` arrives, the body errors, the token
/// is cancelled or the receiver is dropped. Returns the number of fragments
/// forwarded.
pub async fn pump<S, B, E>(
    body: S,
    tx: mpsc::Sender<String>,
    cancellation: CancellationToken,
) -> usize
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut body = std::pin::pin!(body);
    let mut lines = LineBuffer::default();
    let mut forwarded = 0;

    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                debug!("Stream cancelled after {} fragments", forwarded);
                return forwarded;
            }
            chunk = body.next() => chunk,
        };

        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                debug!("Stream body failed: {}", e);
                return forwarded;
            }
            None => break,
        };

        for line in lines.push(bytes.as_ref()) {
            if !forward(&line, &tx, &cancellation, &mut forwarded).await {
                return forwarded;
            }
        }
    }

    if let Some(line) = lines.finish() {
        forward(&line, &tx, &cancellation, &mut forwarded).await;
    }
    forwarded
}

/// `false` once the stream should end.
async fn forward(
    line: &str,
    tx: &mpsc::Sender<String>,
    cancellation: &CancellationToken,
    forwarded: &mut usize,
) -> bool {
    match parse_line(line) {
        SseLine::Skip => true,
        SseLine::Done => false,
        SseLine::Fragment(text) => {
            let sent = tokio::select! {
                biased;
                _ = cancellation.cancelled() => false,
                sent = tx.send(text) => sent.is_ok(),
            };
            if sent {
                *forwarded += 1;
            }
            sent
        }
    }
}
