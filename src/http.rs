//! HTTP servers: the public application router and the Prometheus endpoint.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{Router, middleware};
use tokio::net::TcpListener;

use crate::handlers::{admin, download, stats};
use crate::state::AppState;

/// Build the application router with the access gate in front of every route.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stats", get(stats::stats))
        .route("/health", get(stats::health))
        .route("/download/:id", post(download::download))
        .route("/admin/bans", get(admin::list_bans))
        .route("/admin/ban", post(admin::add_ban))
        .route("/admin/ban/:kind", delete(admin::remove_blank_ban))
        .route("/admin/ban/:kind/:value", delete(admin::remove_ban))
        .route(
            "/admin/config",
            get(admin::get_config).post(admin::update_config),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            crate::gate::enforce,
        ))
        .layer(middleware::from_fn(crate::telemetry::trace_requests))
        .with_state(state)
}

/// Serve the application until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Run the HTTP server for Prometheus metrics.
///
/// Binds to `0.0.0.0:port` and serves the `/metrics` endpoint.
/// This is a long-running task that should be spawned in the background.
pub async fn run_metrics_server(port: u16) {
    let app = Router::new().route("/metrics", get(metrics_handler));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Prometheus HTTP server listening on {}", addr);

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind metrics server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Metrics server error: {}", e);
    }
}
