//! Headless Buraco client.
//!
//! # Architecture
//!
//! ```text
//! main (composition root)
//!   ├─→ ClientConfig::from_env      (client-bootstrap)
//!   ├─→ logging::setup_logging      (stderr + per-game file)
//!   ├─→ ClientBuilder               (HTTP api + WebSocket connector → GameClient)
//!   └─→ runner::run                 (create/open, join, watch, teardown)
//! ```
pub mod logging;
pub mod runner;

pub use runner::{RunReport, StopReason, run};
