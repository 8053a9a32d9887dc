//! UTF-8 safe chunk splitting and paced, ordered delivery.
//!
//! Replies routinely exceed a single Meshtastic frame. [`chunk_utf8`] splits
//! a reply into transport-sized pieces without ever breaking a codepoint,
//! preferring newline boundaries, and concatenating the pieces reproduces
//! the original text byte for byte. [`Pacer::send`] then emits the chunks
//! strictly in order with a fixed delay between them; the transport offers
//! no delivery acknowledgment, so pacing is what keeps multi-frame replies
//! readable on the far side.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::config::DeliveryConfig;
use crate::transport::{DmTransport, SendFailure};

/// Chunk a UTF-8 string into <= max_bytes segments without splitting codepoints.
/// Attempts to split on newline boundaries preferentially, then falls back to
/// byte slicing. Concatenating the result reproduces `text` exactly.
pub fn chunk_utf8(text: &str, max_bytes: usize) -> Vec<String> {
    let max_bytes = max_bytes.max(4);
    if text.len() <= max_bytes {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max_bytes {
            chunks.push(remaining.to_string());
            break;
        }
        let mut end = max_bytes.min(remaining.len());
        while end > 0 && !remaining.is_char_boundary(end) {
            end -= 1;
        }
        // Prefer the last newline in this window unless it would leave a
        // tiny fragment behind.
        let slice = &remaining[..end];
        if let Some(pos) = slice.rfind('\n') {
            if pos > 0 && pos + 1 >= end / 2 {
                let piece = &slice[..=pos];
                chunks.push(piece.to_string());
                remaining = &remaining[pos + 1..];
                continue;
            }
        }
        chunks.push(slice.to_string());
        remaining = &remaining[end..];
    }
    chunks
}

/// Sends one reply as an ordered, paced sequence of chunks.
#[derive(Clone)]
pub struct Pacer {
    transport: Arc<dyn DmTransport>,
    chunk_bytes: usize,
    delay: Duration,
    show_markers: bool,
}

impl Pacer {
    pub fn new(transport: Arc<dyn DmTransport>, delivery: &DeliveryConfig) -> Self {
        Self {
            transport,
            chunk_bytes: delivery.chunk_bytes,
            delay: Duration::from_millis(delivery.inter_chunk_delay_ms),
            show_markers: delivery.show_chunk_markers,
        }
    }

    /// Split `text` and emit the chunks in order with the configured delay
    /// between consecutive sends. On the first send failure the remaining
    /// chunks of this reply are dropped and the partial delivery is logged;
    /// there is no automatic resend.
    pub async fn send(&self, dest: &str, text: &str) -> Result<(), SendFailure> {
        // Markers eat into the budget, so reserve room for the prefix.
        let budget = if self.show_markers {
            self.chunk_bytes.saturating_sub(10).max(4)
        } else {
            self.chunk_bytes
        };
        let chunks = chunk_utf8(text, budget);
        let total = chunks.len();

        for (idx, chunk) in chunks.into_iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.delay).await;
            }
            let payload = if self.show_markers && total > 1 {
                format!("[{}/{}] {}", idx + 1, total, chunk)
            } else {
                chunk
            };
            debug!(
                "DM -> {} chunk {}/{} ({} bytes)",
                crate::logutil::escape_log(dest),
                idx + 1,
                total,
                payload.len()
            );
            if let Err(e) = self.transport.send_direct_message(dest, &payload) {
                warn!(
                    "DM to {} failed at chunk {}/{}: {} (dropping remainder)",
                    crate::logutil::escape_log(dest),
                    idx + 1,
                    total,
                    e
                );
                return Err(e);
            }
        }
        Ok(())
    }
}
