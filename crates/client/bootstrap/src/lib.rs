//! Shared bootstrap utilities for the client binary.
//!
//! Reads configuration from the environment and assembles a
//! [`GameClient`](client_core::GameClient) from the HTTP and WebSocket
//! transports.
pub mod builder;
pub mod config;

pub use builder::{ClientBuilder, ClientSetup};
pub use config::ClientConfig;
