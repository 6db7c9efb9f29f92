//! WebSocket ownership: dialing, reconnection, raw frame passing.
//!
//! The single socket is exclusively owned here; everything else in the crate
//! sends through the message router, which holds the sealed
//! [`ConnectionHandle`].

pub mod backoff;
pub mod manager;

pub use backoff::ReconnectPolicy;
pub use manager::{ConnectionEvent, ConnectionHandle, ConnectionManager, WireFrame};
