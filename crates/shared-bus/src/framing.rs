//! # Frame Codec
//!
//! A frame is one JSON-encoded [`WireMessage`] followed by a single `#`.
//! Transports may split or merge frames arbitrarily, so receivers keep a
//! partial-read buffer per remote endpoint and only decode complete frames.

use crate::errors::FramingError;
use shared_types::WireMessage;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::warn;

/// Terminates every frame.
pub const FRAME_DELIMITER: u8 = b'#';

/// Upper bound on buffered bytes for one endpoint without a delimiter.
pub const MAX_PENDING_BYTES: usize = 1 << 20;

/// Encode a message as a complete frame.
pub fn encode_frame(message: &WireMessage) -> Result<Vec<u8>, FramingError> {
    let mut bytes = message.encode()?;
    if let Some(offset) = bytes.iter().position(|&b| b == FRAME_DELIMITER) {
        return Err(FramingError::DelimiterInPayload {
            message: message.name(),
            offset,
        });
    }
    bytes.push(FRAME_DELIMITER);
    Ok(bytes)
}

/// Reassembles frames from byte chunks, one buffer per endpoint.
#[derive(Debug)]
pub struct FrameBuffer<K> {
    pending: HashMap<K, Vec<u8>>,
    dropped: u64,
}

impl<K> Default for FrameBuffer<K> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            dropped: 0,
        }
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug> FrameBuffer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk received from `from` and return every message completed
    /// by it, in arrival order.
    ///
    /// Frames that fail to decode are logged and discarded; the rest of the
    /// chunk is still processed.
    pub fn push(&mut self, from: K, chunk: &[u8]) -> Vec<WireMessage> {
        let buffer = self.pending.entry(from.clone()).or_default();
        buffer.extend_from_slice(chunk);

        let mut messages = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = buffer[consumed..].iter().position(|&b| b == FRAME_DELIMITER) {
            let frame = &buffer[consumed..consumed + offset];
            consumed += offset + 1;

            if frame.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match WireMessage::decode(frame) {
                Ok(message) => messages.push(message),
                Err(err) => {
                    self.dropped += 1;
                    warn!(from = ?from, error = %err, bytes = frame.len(), "Dropping undecodable frame");
                }
            }
        }
        buffer.drain(..consumed);

        if buffer.len() > MAX_PENDING_BYTES {
            self.dropped += 1;
            warn!(from = ?from, bytes = buffer.len(), "Partial frame exceeds buffer limit, discarding");
            buffer.clear();
        }

        messages
    }

    /// Bytes waiting for a delimiter from `from`.
    pub fn pending_bytes(&self, from: &K) -> usize {
        self.pending.get(from).map_or(0, Vec::len)
    }

    /// Frames discarded so far.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// Forget an endpoint, e.g. when its connection closes.
    pub fn close(&mut self, from: &K) {
        self.pending.remove(from);
    }
}
