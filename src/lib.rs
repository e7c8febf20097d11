//! macrogate - access-controlled macro download gateway.
//!
//! Serves a fixed catalog of artifacts behind an ordered access gate with a
//! persistent ban registry, fingerprint escalation and sticky ban markers.

pub mod artifacts;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod security;
pub mod state;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use db::Database;
pub use state::AppState;
