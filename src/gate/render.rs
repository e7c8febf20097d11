//! Responses the gate produces on its own.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};

/// Seconds clients are told to wait while maintenance is on.
pub const MAINTENANCE_RETRY_AFTER_SECS: u32 = 300;

const DENIED_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Nope</title></head>
<body style="background:#111;color:#eee;font-family:monospace;text-align:center;padding-top:20vh">
<h1>&#x1F6AB; nothing to see here</h1>
<p>This page is not available.</p>
</body>
</html>
"#;

const DEFAULT_MAINTENANCE_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Maintenance</title></head>
<body style="font-family:sans-serif;text-align:center;padding-top:20vh">
<h1>Down for maintenance</h1>
<p>We will be back shortly.</p>
</body>
</html>
"#;

/// The single response every gate denial renders to.
pub fn denied() -> Response {
    let mut response = (StatusCode::FORBIDDEN, Html(DENIED_PAGE)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Maintenance page, falling back to a built-in body when none is stored.
pub fn maintenance(page_html: &str) -> Response {
    let body = if page_html.trim().is_empty() {
        DEFAULT_MAINTENANCE_PAGE.to_string()
    } else {
        page_html.to_string()
    };

    let mut response = (StatusCode::SERVICE_UNAVAILABLE, Html(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(MAINTENANCE_RETRY_AFTER_SECS));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
