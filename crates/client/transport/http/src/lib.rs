//! [`GameApi`](client_core::GameApi) over the game service's REST endpoints.
mod client;
mod types;

pub use client::HttpGameApi;
