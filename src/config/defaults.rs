//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::SocketAddr;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

pub fn default_database_path() -> String {
    "macros/macros.db".to_string()
}

// =============================================================================
// Artifact Defaults
// =============================================================================

pub fn default_artifacts_dir() -> String {
    "macros".to_string()
}

// =============================================================================
// Security Defaults
// =============================================================================

/// Roughly ten years.
pub fn default_sticky_ban_days() -> u32 {
    3650
}

// =============================================================================
// Access Defaults
// =============================================================================

pub fn default_maintenance_paths() -> Vec<String> {
    vec!["/auth".to_string(), "/logout".to_string(), "/admin".to_string()]
}

// =============================================================================
// Challenge Defaults
// =============================================================================

pub fn default_verify_url() -> String {
    "https://hcaptcha.com/siteverify".to_string()
}

pub fn default_challenge_timeout_secs() -> u64 {
    5
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_filter() -> String {
    "info".to_string()
}
