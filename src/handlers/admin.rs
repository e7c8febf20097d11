//! Admin console: ban management and maintenance settings.
//!
//! Admin routes are exempt from maintenance mode, so privilege is checked here
//! again rather than trusted from the gate.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::db::MaintenanceConfig;
use crate::error::AdminError;
use crate::gate::{IdentityContext, render};
use crate::security::{BanKind, BanRegistry};
use crate::state::AppState;
use crate::storage::{BanList, Storage};

/// Maintenance settings as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigView {
    pub maintenance_enabled: bool,
    pub maintenance_html: String,
}

impl From<MaintenanceConfig> for ConfigView {
    fn from(m: MaintenanceConfig) -> Self {
        Self {
            maintenance_enabled: m.enabled,
            maintenance_html: m.page_html,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BanRequest {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Option<String>,
}

/// Mutation surface over the ban registry and maintenance settings.
#[derive(Clone)]
pub struct AdminConsole {
    registry: BanRegistry,
    store: Arc<dyn Storage>,
}

impl AdminConsole {
    pub fn new(registry: BanRegistry, store: Arc<dyn Storage>) -> Self {
        Self { registry, store }
    }

    pub async fn list_bans(&self) -> Result<BanList, AdminError> {
        Ok(self.registry.list_bans().await?)
    }

    /// Add a ban. The kind is checked and the value trimmed before any write.
    pub async fn add_ban(&self, kind: &str, value: &str) -> Result<BanKind, AdminError> {
        let kind: BanKind = kind.parse()?;
        let value = value.trim();
        if value.is_empty() {
            return Err(AdminError::EmptyValue);
        }

        match kind {
            BanKind::Identity => {
                self.registry.ban_identity(value).await?;
            }
            BanKind::Fingerprint => self.registry.ban_fingerprint(value).await?,
        }
        info!(kind = %kind, value = %value, "Ban added");
        Ok(kind)
    }

    /// Remove a ban and return the number of rows removed.
    ///
    /// An identity removal without a value clears rows with a blank id.
    pub async fn remove_ban(&self, kind: &str, value: Option<&str>) -> Result<u64, AdminError> {
        let kind: BanKind = kind.parse()?;
        let value = value.map(str::trim).filter(|v| !v.is_empty());

        let removed = match (kind, value) {
            (_, Some(value)) => self.registry.remove_ban(kind, value).await?,
            (BanKind::Identity, None) => self.registry.remove_blank_identity_bans().await?,
            (BanKind::Fingerprint, None) => return Err(AdminError::EmptyValue),
        };
        info!(kind = %kind, value = value.unwrap_or("<blank>"), removed, "Ban removed");
        Ok(removed)
    }

    pub async fn config(&self) -> Result<ConfigView, AdminError> {
        Ok(self.store.maintenance().await?.into())
    }

    /// Apply a partial settings update.
    ///
    /// `maintenance_enabled` is applied only when it is a boolean and
    /// `maintenance_html` only when it is a string. Other fields are ignored.
    pub async fn update_config(&self, body: &Value) -> Result<ConfigView, AdminError> {
        let Some(fields) = body.as_object() else {
            return Err(AdminError::InvalidBody("expected a JSON object".to_string()));
        };

        if let Some(enabled) = fields.get("maintenance_enabled").and_then(Value::as_bool) {
            self.store.set_maintenance_enabled(enabled).await?;
            info!(enabled, "Maintenance mode updated");
        }
        if let Some(html) = fields.get("maintenance_html").and_then(Value::as_str) {
            self.store.set_maintenance_html(html).await?;
            info!(bytes = html.len(), "Maintenance page updated");
        }

        self.config().await
    }
}

/// Admin handlers answer non-privileged callers exactly like the gate does.
fn require_privileged(ctx: &Option<Extension<IdentityContext>>) -> Result<(), Response> {
    match ctx {
        Some(Extension(ctx)) if ctx.is_privileged() => Ok(()),
        _ => Err(render::denied()),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, AdminError> {
    serde_json::from_slice(body).map_err(|e| AdminError::InvalidBody(e.to_string()))
}

/// GET /admin/bans
pub async fn list_bans(
    State(state): State<Arc<AppState>>,
    ctx: Option<Extension<IdentityContext>>,
) -> Response {
    if let Err(denied) = require_privileged(&ctx) {
        return denied;
    }
    match state.admin.list_bans().await {
        Ok(bans) => Json(bans).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /admin/ban
pub async fn add_ban(
    State(state): State<Arc<AppState>>,
    ctx: Option<Extension<IdentityContext>>,
    body: Bytes,
) -> Response {
    if let Err(denied) = require_privileged(&ctx) {
        return denied;
    }
    let result = async {
        let req: BanRequest = parse_body(&body)?;
        let value = req.value.unwrap_or_default();
        let kind = state.admin.add_ban(&req.kind, &value).await?;
        Ok::<_, AdminError>(json!({ "ok": true, "type": kind.as_str(), "value": value.trim() }))
    }
    .await;

    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    }
}

/// DELETE /admin/ban/:kind
pub async fn remove_blank_ban(
    State(state): State<Arc<AppState>>,
    ctx: Option<Extension<IdentityContext>>,
    Path(kind): Path<String>,
) -> Response {
    if let Err(denied) = require_privileged(&ctx) {
        return denied;
    }
    removal_response(state.admin.remove_ban(&kind, None).await)
}

/// DELETE /admin/ban/:kind/:value
pub async fn remove_ban(
    State(state): State<Arc<AppState>>,
    ctx: Option<Extension<IdentityContext>>,
    Path((kind, value)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = require_privileged(&ctx) {
        return denied;
    }
    removal_response(state.admin.remove_ban(&kind, Some(&value)).await)
}

fn removal_response(result: Result<u64, AdminError>) -> Response {
    match result {
        Ok(removed) => Json(json!({ "removed": removed })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /admin/config
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    ctx: Option<Extension<IdentityContext>>,
) -> Response {
    if let Err(denied) = require_privileged(&ctx) {
        return denied;
    }
    match state.admin.config().await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /admin/config
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    ctx: Option<Extension<IdentityContext>>,
    body: Bytes,
) -> Response {
    if let Err(denied) = require_privileged(&ctx) {
        return denied;
    }
    let result = async {
        let value: Value = parse_body(&body)?;
        state.admin.update_config(&value).await
    }
    .await;

    match result {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.into_response(),
    }
}
