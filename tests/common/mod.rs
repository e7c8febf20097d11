//! Integration test common infrastructure.
//!
//! Provides an in-process test server and a cookie-aware HTTP client.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::{ADMIN_ID, ARTIFACTS, GOOD_TOKEN, SEEDED_BANNED_ID, TestServer};
