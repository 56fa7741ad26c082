//! # Network Adapters
//!
//! Two implementations of [`NetworkSink`]:
//!
//! - [`InMemoryNetwork`]: one unbounded tokio channel per node. Frames are
//!   encoded to bytes and optionally split into chunks so receivers exercise
//!   their [`FrameBuffer`](crate::FrameBuffer).
//! - [`LoopbackNetwork`]: a single shared queue of decoded messages that a
//!   test drives by hand, one delivery at a time.

use crate::errors::{FramingError, TransportError};
use crate::framing::encode_frame;
use crate::handler::NetworkSink;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{NodeId, WireMessage};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Raw bytes from one node, as a transport would deliver them.
#[derive(Debug, Clone)]
pub struct Datagram {
    pub from: NodeId,
    pub bytes: Vec<u8>,
}

type Routes = Arc<RwLock<HashMap<NodeId, mpsc::UnboundedSender<Datagram>>>>;

// =============================================================================
// IN-MEMORY NETWORK
// =============================================================================

/// Channel-per-node network for the tokio runtime.
///
/// Channels are unbounded: nodes send while handling a message, and a bounded
/// channel between two busy nodes could block both.
#[derive(Clone, Default)]
pub struct InMemoryNetwork {
    routes: Routes,
    chunk_size: Option<usize>,
    frames_sent: Arc<AtomicU64>,
}

impl InMemoryNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split every frame into chunks of at most `chunk_size` bytes.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Attach a node and return its inbox. Re-registering replaces the inbox.
    pub fn register(&self, node: NodeId) -> mpsc::UnboundedReceiver<Datagram> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.routes.write().insert(node, sender);
        receiver
    }

    /// Detach a node; later sends to it fail with `UnknownNode`.
    pub fn disconnect(&self, node: NodeId) {
        self.routes.write().remove(&node);
    }

    /// Sending handle for `local`.
    #[must_use]
    pub fn handle(&self, local: NodeId) -> NetworkHandle {
        NetworkHandle {
            local,
            routes: Arc::clone(&self.routes),
            chunk_size: self.chunk_size,
            frames_sent: Arc::clone(&self.frames_sent),
        }
    }

    /// Registered node ids, sorted.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.routes.read().keys().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    /// Frames handed to the transport across all handles.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }
}

/// A node's view of the [`InMemoryNetwork`].
#[derive(Clone)]
pub struct NetworkHandle {
    local: NodeId,
    routes: Routes,
    chunk_size: Option<usize>,
    frames_sent: Arc<AtomicU64>,
}

impl NetworkHandle {
    pub fn local(&self) -> NodeId {
        self.local
    }
}

#[async_trait]
impl NetworkSink for NetworkHandle {
    async fn send(&self, to: NodeId, message: WireMessage) -> Result<(), TransportError> {
        let frame = encode_frame(&message)?;
        let sender = self
            .routes
            .read()
            .get(&to)
            .cloned()
            .ok_or(TransportError::UnknownNode(to))?;

        let chunk_size = self.chunk_size.unwrap_or(frame.len()).max(1);
        for chunk in frame.chunks(chunk_size) {
            sender
                .send(Datagram {
                    from: self.local,
                    bytes: chunk.to_vec(),
                })
                .map_err(|_| TransportError::Disconnected(to))?;
        }

        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        trace!(from = self.local, to, kind = message.name(), bytes = frame.len(), "Frame sent");
        Ok(())
    }
}

// =============================================================================
// LOOPBACK NETWORK
// =============================================================================

/// A message in flight on the [`LoopbackNetwork`].
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub from: NodeId,
    pub to: NodeId,
    pub message: WireMessage,
}

/// Single FIFO queue shared by every node; nothing moves until the caller
/// pops an envelope and delivers it.
#[derive(Clone, Default)]
pub struct LoopbackNetwork {
    queue: Arc<Mutex<VecDeque<Envelope>>>,
}

impl LoopbackNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sink(&self, local: NodeId) -> LoopbackSink {
        LoopbackSink {
            local,
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn pop(&self) -> Option<Envelope> {
        self.queue.lock().pop_front()
    }

    pub fn drain(&self) -> Vec<Envelope> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

/// A node's view of the [`LoopbackNetwork`].
#[derive(Clone)]
pub struct LoopbackSink {
    local: NodeId,
    queue: Arc<Mutex<VecDeque<Envelope>>>,
}

#[async_trait]
impl NetworkSink for LoopbackSink {
    async fn send(&self, to: NodeId, message: WireMessage) -> Result<(), TransportError> {
        // Round-trip through the codec so tests see exactly what a peer would.
        let frame = encode_frame(&message)?;
        let body = &frame[..frame.len() - 1];
        let message = WireMessage::decode(body).map_err(FramingError::from)?;

        self.queue.lock().push_back(Envelope {
            from: self.local,
            to,
            message,
        });
        Ok(())
    }
}
