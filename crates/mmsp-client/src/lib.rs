//! # mmsp-client
//!
//! Client for the MMSP management protocol: JSON-RPC 2.0 calls and server
//! notifications over one authenticated WebSocket.
//!
//! - [`transport`]: handshake ([`Connector`]) and the per-socket I/O task
//! - [`correlator`]: matches replies to pending calls by id
//! - [`router`]: classifies inbound frames as replies or notifications
//! - [`supervisor`]: fixed-delay reconnection after unexpected drops
//! - [`client`]: the [`MmspClient`] facade tying them together
//! - [`api`]: typed management operations
//! - [`activity`]: rolling log of server events

#![deny(unsafe_code)]

pub mod activity;
pub mod api;
pub mod client;
pub mod correlator;
pub mod observers;
pub mod router;
pub mod supervisor;
pub mod transport;
pub mod wire;

#[cfg(test)]
mod testutil;

pub use activity::{ActivityEntry, ActivityKind, ActivityLog};
pub use api::MAX_PERMISSION_LEVEL;
pub use client::{ClientOptions, DEFAULT_CALL_TIMEOUT, MmspClient};
pub use observers::Subscription;
pub use supervisor::{DEFAULT_RECONNECT_DELAY, SupervisorState};
pub use transport::{Connector, Socket, WsConnector};
