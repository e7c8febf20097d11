//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, ArtifactsConfig)
//! - [`security`]: Cookie signing secret and sticky ban lifetime
//! - [`access`]: Allow-list, privileged roles, maintenance bypass paths, seeded bans
//! - [`challenge`]: Captcha verification endpoint
//! - [`validation`]: Startup checks that report every problem at once

mod access;
mod challenge;
mod defaults;
mod security;
mod types;
pub mod validation;

pub use access::AccessConfig;
pub use challenge::ChallengeConfig;
pub use security::{SecurityConfig, is_weak_secret};
pub use types::{
    ArtifactsConfig, Config, ConfigError, DatabaseConfig, LogFormat, LoggingConfig, ServerConfig,
};
