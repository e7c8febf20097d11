//! Telemetry: subscriber setup, request spans and latency timing.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {e}");
    }
}

/// Guard for timing a request and recording metrics.
///
/// Records latency when dropped.
pub struct RequestTimer {
    route: String,
    start: Instant,
}

impl RequestTimer {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_request(&self.route, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for one HTTP request.
    pub fn request(id: &str, method: &str, path: &str) -> Span {
        info_span!("request", id = %id, method = %method, path = %path)
    }
}

/// Bounded metric label for a request path: its first segment, if known.
fn route_label(path: &str) -> &'static str {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
    match first {
        "" => "/",
        "stats" => "/stats",
        "health" => "/health",
        "download" => "/download",
        "admin" => "/admin",
        _ => "other",
    }
}

/// Outermost middleware: wraps the request in a span and times it.
pub async fn trace_requests(req: Request, next: Next) -> Response {
    let id = uuid::Uuid::new_v4().to_string();
    let route = route_label(req.uri().path());
    let span = spans::request(&id, req.method().as_str(), req.uri().path());

    async move {
        let _timer = RequestTimer::new(route);
        let response = next.run(req).await;
        tracing::debug!(status = response.status().as_u16(), "Request complete");
        response
    }
    .instrument(span)
    .await
}
