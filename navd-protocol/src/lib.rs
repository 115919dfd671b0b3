//! # navd-protocol
//!
//! Wire protocol for the navd routing daemon.
//!
//! This crate provides:
//! - Length-prefixed framing over a byte stream
//! - JSON message serialization/deserialization
//! - Typed command and result messages
//! - Protocol error types and constants

pub mod codec;
pub mod error;
pub mod frame;
pub mod message;

pub use codec::{Decoder, Encoder};
pub use error::ProtocolError;
pub use frame::{Frame, LENGTH_PREFIX_SIZE};
pub use message::{
    CommandEnvelope, CommandKind, Edge, Node, RouteStatus, RoutingRequest, RoutingResult, Waypoint,
};

/// Default port the routing daemon listens on.
pub const DEFAULT_PORT: u16 = 8040;

/// Default radius in meters for snapping waypoints to the road network.
pub const DEFAULT_LOOKUP_RADIUS: u32 = 10000;

/// Maximum frame payload size (16 MiB).
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;
