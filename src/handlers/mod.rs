//! HTTP handlers.
//!
//! Handlers run behind the access gate and read the caller from the
//! [`IdentityContext`](crate::gate::IdentityContext) request extension it
//! attaches.

pub mod admin;
pub mod download;
pub mod stats;

pub use admin::{AdminConsole, ConfigView};
pub use download::{DownloadController, DownloadRequest};
pub use stats::StatsResponse;
