//! Public read-only endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Extension;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::gate::{Identity, IdentityContext};
use crate::state::AppState;
use crate::storage::Storage;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total: i64,
    pub macros: BTreeMap<String, i64>,
    pub user: Option<Identity>,
}

/// Fold stored counters over the configured ids; missing rows read as zero
/// and rows for unconfigured ids are left out.
pub fn summarize(ids: &[String], counts: Vec<(String, i64)>) -> (i64, BTreeMap<String, i64>) {
    let mut macros: BTreeMap<String, i64> = ids.iter().map(|id| (id.clone(), 0)).collect();
    for (id, downloads) in counts {
        if let Some(slot) = macros.get_mut(&id) {
            *slot = downloads;
        }
    }
    let total = macros.values().sum();
    (total, macros)
}

/// GET /stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    ctx: Option<Extension<IdentityContext>>,
) -> Response {
    let counts = match state.store.download_counts().await {
        Ok(counts) => counts,
        Err(e) => {
            error!(error = %e, "Failed to read download counters");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "stats_unavailable" })),
            )
                .into_response();
        }
    };

    let (total, macros) = summarize(state.catalog.ids(), counts);
    let user = ctx.and_then(|Extension(ctx)| ctx.identity);
    Json(StatsResponse {
        total,
        macros,
        user,
    })
    .into_response()
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
