//! # Shared Bus - Node-to-Node Plumbing
//!
//! Everything a node needs to talk to other nodes without knowing how the
//! bytes travel.
//!
//! ```text
//! ┌──────────────┐  NetworkSink::send   ┌───────────────┐  Datagram   ┌──────────────┐
//! │ PeerService  │ ───────────────────▶ │ encode_frame  │ ──────────▶ │ FrameBuffer  │
//! │ (handler)    │                      │ "{...}#"      │             │ per endpoint │
//! └──────────────┘                      └───────────────┘             └──────┬───────┘
//!        ▲                                                                   │
//!        └──────────────── MessageHandler::handle_message ◀──────────────────┘
//! ```
//!
//! - **Ports**: [`NetworkSink`] (outbound), [`MessageHandler`] (inbound),
//!   [`Clock`].
//! - **Framing**: JSON documents terminated by `#`, reassembled per sender.
//! - **Adapters**: [`InMemoryNetwork`] for the tokio runtime and
//!   [`LoopbackNetwork`] for deterministic, single-threaded tests.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod clock;
pub mod errors;
pub mod framing;
pub mod handler;
pub mod network;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use errors::{FramingError, TransportError};
pub use framing::{encode_frame, FrameBuffer, FRAME_DELIMITER, MAX_PENDING_BYTES};
pub use handler::{MessageHandler, NetworkSink};
pub use network::{Datagram, Envelope, InMemoryNetwork, LoopbackNetwork, LoopbackSink, NetworkHandle};
