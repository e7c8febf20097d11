//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("artifacts.ids must list at least one artifact")]
    NoArtifacts,
    #[error("artifacts.ids entry '{0}' must match [a-z0-9-]+")]
    InvalidArtifactId(String),
    #[error("artifacts.ids contains '{0}' more than once")]
    DuplicateArtifactId(String),
    #[error("artifacts.dir is required")]
    MissingArtifactsDir,
    #[error("challenge.secret is required")]
    MissingChallengeSecret,
    #[error("challenge.verify_url must be an http(s) URL, got '{0}'")]
    InvalidVerifyUrl(String),
    #[error("challenge.timeout_secs must be between 1 and 60, got {0}")]
    InvalidChallengeTimeout(u64),
    #[error("security.cookie_secret is required")]
    MissingCookieSecret,
    #[error("security.sticky_ban_days must be positive")]
    InvalidStickyBanDays,
    #[error("database.path is required")]
    MissingDatabasePath,
}

/// Whether `id` is usable both as a route segment and a file stem.
pub fn is_valid_artifact_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Artifacts
    if config.artifacts.ids.is_empty() {
        errors.push(ValidationError::NoArtifacts);
    }
    let mut seen = HashSet::new();
    for id in &config.artifacts.ids {
        if !is_valid_artifact_id(id) {
            errors.push(ValidationError::InvalidArtifactId(id.clone()));
        } else if !seen.insert(id.as_str()) {
            errors.push(ValidationError::DuplicateArtifactId(id.clone()));
        }
    }
    if config.artifacts.dir.trim().is_empty() {
        errors.push(ValidationError::MissingArtifactsDir);
    }

    // Challenge verification
    if config.challenge.secret.trim().is_empty() {
        errors.push(ValidationError::MissingChallengeSecret);
    }
    let url = &config.challenge.verify_url;
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        errors.push(ValidationError::InvalidVerifyUrl(url.clone()));
    }
    if !(1..=60).contains(&config.challenge.timeout_secs) {
        errors.push(ValidationError::InvalidChallengeTimeout(
            config.challenge.timeout_secs,
        ));
    }

    if config.security.cookie_secret.trim().is_empty() {
        errors.push(ValidationError::MissingCookieSecret);
    }
    if config.security.sticky_ban_days == 0 {
        errors.push(ValidationError::InvalidStickyBanDays);
    }

    if config.database.path.trim().is_empty() {
        errors.push(ValidationError::MissingDatabasePath);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
