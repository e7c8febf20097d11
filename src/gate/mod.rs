//! Access gate.
//!
//! Every request runs through [`enforce`] before routing. The decision
//! pipeline is strictly ordered and stops at the first decisive step:
//!
//! 1. maintenance (unless the path is exempt or the caller is privileged)
//! 2. sticky ban marker
//! 3. authentication, for protected routes
//! 4. privilege bypass
//! 5. fingerprint ban
//! 6. identity ban, escalating the fingerprint and issuing a sticky marker
//! 7. allow
//!
//! Denials all render to the same response. The reason only reaches logs and
//! metrics.

pub mod identity;
pub mod render;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use crate::config::AccessConfig;
use crate::security::fingerprint::FingerprintSource;
use crate::security::{BanRegistry, StickyBan};
use crate::state::AppState;
use crate::storage::Storage;

pub use identity::{Identity, IdentityContext, UserRecord};

/// Why a request was denied. Never shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    StickyBan,
    Unauthenticated,
    FingerprintBanned,
    IdentityBanned,
    StoreUnavailable,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::StickyBan => "sticky_ban",
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::FingerprintBanned => "fingerprint_banned",
            DenyReason::IdentityBanned => "identity_banned",
            DenyReason::StoreUnavailable => "store_unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Serve the maintenance page with this body.
    Maintenance(String),
    Deny {
        reason: DenyReason,
        /// Set the sticky ban marker on the response.
        issue_sticky: bool,
    },
}

impl Decision {
    fn deny(reason: DenyReason) -> Self {
        Decision::Deny {
            reason,
            issue_sticky: false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Maintenance(_) => "maintenance",
            Decision::Deny { reason, .. } => reason.as_str(),
        }
    }
}

/// Whether a route needs an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

const PROTECTED_PREFIXES: &[&str] = &["/download", "/admin"];

impl RouteClass {
    pub fn for_path(path: &str) -> Self {
        let protected = PROTECTED_PREFIXES.iter().any(|prefix| {
            path == *prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        });
        if protected {
            RouteClass::Protected
        } else {
            RouteClass::Public
        }
    }
}

/// The decision pipeline, independent of HTTP plumbing.
#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn Storage>,
    registry: BanRegistry,
    access: Arc<AccessConfig>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn Storage>, registry: BanRegistry, access: Arc<AccessConfig>) -> Self {
        Self {
            store,
            registry,
            access,
        }
    }

    pub async fn evaluate(&self, path: &str, class: RouteClass, ctx: &IdentityContext) -> Decision {
        let maintenance = match self.store.maintenance().await {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "Failed to read maintenance settings");
                return Decision::deny(DenyReason::StoreUnavailable);
            }
        };
        if maintenance.enabled && !self.access.is_maintenance_exempt(path) && !ctx.is_privileged()
        {
            return Decision::Maintenance(maintenance.page_html);
        }

        if ctx.sticky.is_some() {
            return Decision::deny(DenyReason::StickyBan);
        }

        if class == RouteClass::Public {
            return Decision::Allow;
        }

        let Some(identity) = ctx.identity.as_ref() else {
            return Decision::deny(DenyReason::Unauthenticated);
        };

        if identity.privileged {
            return Decision::Allow;
        }

        if let Some(fp) = ctx.fingerprint_value() {
            match self.registry.is_fingerprint_banned(fp).await {
                Ok(true) => return Decision::deny(DenyReason::FingerprintBanned),
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "Fingerprint ban lookup failed");
                    return Decision::deny(DenyReason::StoreUnavailable);
                }
            }
        }

        match self.registry.is_identity_banned(identity.id()).await {
            Ok(true) => {
                self.registry
                    .escalate(identity.id(), ctx.fingerprint_value())
                    .await;
                Decision::Deny {
                    reason: DenyReason::IdentityBanned,
                    issue_sticky: true,
                }
            }
            Ok(false) => Decision::Allow,
            Err(e) => {
                warn!(error = %e, "Identity ban lookup failed");
                Decision::deny(DenyReason::StoreUnavailable)
            }
        }
    }
}

/// Gate middleware: resolves the caller, runs the pipeline and either
/// forwards the request (with the [`IdentityContext`] attached) or answers it.
pub async fn enforce(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let now = chrono::Utc::now().timestamp();
    let path = req.uri().path().to_string();
    let ctx = IdentityContext::resolve(&jar, &state.signer, &state.config.access, now);
    let decision = state
        .gate
        .evaluate(&path, RouteClass::for_path(&path), &ctx)
        .await;
    crate::metrics::record_gate_decision(decision.label());

    let secure = state.config.security.secure_cookies;
    match decision {
        Decision::Allow => {
            let jar = match ctx.fingerprint.as_ref() {
                Some(fp) if fp.source == FingerprintSource::Unsigned => {
                    debug!(fingerprint = %fp.value, "Pinning fingerprint to signed cookie");
                    jar.add(fp.pin_cookie(&state.signer, secure))
                }
                _ => jar,
            };
            req.extensions_mut().insert(ctx);
            let response = next.run(req).await;
            (jar, response).into_response()
        }
        Decision::Maintenance(page) => render::maintenance(&page),
        Decision::Deny {
            reason,
            issue_sticky,
        } => {
            warn!(
                reason = reason.as_str(),
                path = %path,
                identity = ctx.identity.as_ref().map(Identity::id).unwrap_or("-"),
                fingerprint = ctx.fingerprint_value().unwrap_or("-"),
                "Access denied"
            );
            if issue_sticky {
                let marker = StickyBan::issue(now, state.config.security.sticky_ban_days);
                let jar = jar.add(marker.cookie(&state.signer, secure));
                (jar, render::denied()).into_response()
            } else {
                render::denied()
            }
        }
    }
}
