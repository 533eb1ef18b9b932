//! # mmsp-core
//!
//! Shared vocabulary for the MMSP management client:
//!
//! - **Connection**: [`ConnectionConfig`] (endpoint + secret) and
//!   [`ConnectionState`] snapshots
//! - **Records**: players, bans, operators, game rules, server status and
//!   settings as they travel on the wire
//! - **Notifications**: [`Notification`] and the known [`NotificationKind`]s
//! - **Errors**: [`ClientError`] taxonomy via `thiserror`
//! - **Logging**: `tracing` subscriber setup and log capture for tests

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod logging;
pub mod notification;
pub mod state;
pub mod types;

pub use config::ConnectionConfig;
pub use errors::{ClientError, Result};
pub use notification::{Notification, NotificationKind};
pub use state::{ConnectionState, ConnectionStatus};
