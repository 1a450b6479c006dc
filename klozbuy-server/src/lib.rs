//! HTTP surface of the Klozbuy neighborhood network: axum routes over the
//! `klozbuy-core` services, plus configuration, logging and metrics.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod state;

pub use server::{create_server, start_server};
