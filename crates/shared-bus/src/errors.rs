//! Transport and framing errors.

use shared_types::{NodeId, WireError};
use thiserror::Error;

/// Errors while turning messages into frames and back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("Encoding failed: {0}")]
    Encode(#[from] WireError),

    /// The encoded message contains the frame delimiter.
    #[error("Encoded {message} contains the frame delimiter at byte {offset}")]
    DelimiterInPayload { message: &'static str, offset: usize },
}

/// Errors while delivering a frame to another node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("No route to node {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is no longer accepting messages")]
    Disconnected(NodeId),

    #[error(transparent)]
    Framing(#[from] FramingError),
}
