//! Ports between a node's protocol logic and the network.

use crate::errors::TransportError;
use async_trait::async_trait;
use shared_types::{NodeId, WireMessage};

/// Outbound port: deliver a message to another node.
///
/// Delivery is per-link FIFO. A successful return means the frame was handed
/// to the transport, not that the receiver processed it.
#[async_trait]
pub trait NetworkSink: Send + Sync {
    async fn send(&self, to: NodeId, message: WireMessage) -> Result<(), TransportError>;

    /// Send the same message to every node in `to`, continuing past
    /// failures. Returns the failures.
    async fn broadcast(&self, to: &[NodeId], message: &WireMessage) -> Vec<(NodeId, TransportError)> {
        let mut failures = Vec::new();
        for &node in to {
            if let Err(err) = self.send(node, message.clone()).await {
                failures.push((node, err));
            }
        }
        failures
    }
}

/// Inbound port: a node's reaction to one decoded message.
///
/// Takes `&mut self`; a node handles its messages one at a time.
#[async_trait]
pub trait MessageHandler: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Identity of the node this handler runs as.
    fn node_id(&self) -> NodeId;

    async fn handle_message(&mut self, from: NodeId, message: WireMessage) -> Result<(), Self::Error>;

    /// Periodic work (transaction creation, timeouts). Nothing by default.
    async fn on_tick(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
