//! Access configuration: who is privileged, who starts banned, and which
//! paths stay reachable during maintenance.

use serde::Deserialize;
use std::collections::HashSet;

use super::defaults::default_maintenance_paths;

#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Identity ids that are always privileged.
    #[serde(default)]
    pub allow_list: HashSet<String>,
    /// Roles that make an identity privileged.
    #[serde(default)]
    pub privileged_roles: HashSet<String>,
    /// Path prefixes served even while maintenance mode is on.
    #[serde(default = "default_maintenance_paths")]
    pub maintenance_paths: Vec<String>,
    /// Identity ids inserted into the ban registry at startup.
    #[serde(default)]
    pub seed_banned_identities: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allow_list: HashSet::new(),
            privileged_roles: HashSet::new(),
            maintenance_paths: default_maintenance_paths(),
            seed_banned_identities: Vec::new(),
        }
    }
}

impl AccessConfig {
    /// Whether `path` may bypass maintenance mode.
    ///
    /// Prefixes match whole segments: `/admin` covers `/admin/config`
    /// but not `/administrator`.
    pub fn is_maintenance_exempt(&self, path: &str) -> bool {
        self.maintenance_paths.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}
