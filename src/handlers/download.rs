//! Artifact downloads: verify, count, then stream.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, FromRequest, Path, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::artifacts::{ArtifactBody, ArtifactCatalog, ArtifactStore, ByteStream, file_name};
use crate::error::DownloadError;
use crate::gate::IdentityContext;
use crate::security::ChallengeVerifier;
use crate::state::AppState;
use crate::storage::Storage;

/// Download request body.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(
        default,
        alias = "h-captcha-response",
        alias = "cf-turnstile-response",
        alias = "g-recaptcha-response"
    )]
    pub token: String,
}

/// Runs the download operation against its collaborators.
#[derive(Clone)]
pub struct DownloadController {
    catalog: Arc<ArtifactCatalog>,
    store: Arc<dyn Storage>,
    verifier: Arc<dyn ChallengeVerifier>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl DownloadController {
    pub fn new(
        catalog: Arc<ArtifactCatalog>,
        store: Arc<dyn Storage>,
        verifier: Arc<dyn ChallengeVerifier>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            catalog,
            store,
            verifier,
            artifacts,
        }
    }

    /// Verify the challenge, count the download and open the artifact.
    ///
    /// The counter is incremented before the artifact is opened and is never
    /// rolled back: a failure after that point over-counts.
    pub async fn download(
        &self,
        id: &str,
        token: &str,
        remote: Option<IpAddr>,
        fingerprint: Option<&str>,
    ) -> Result<ArtifactBody, DownloadError> {
        if !self.catalog.contains(id) {
            return Err(DownloadError::ArtifactNotConfigured(id.to_string()));
        }

        if !self.verifier.verify(token, remote).await {
            info!(artifact = %id, fingerprint = fingerprint.unwrap_or("-"), "Challenge rejected");
            return Err(DownloadError::ChallengeFailed);
        }

        if !self.artifacts.exists(id).await {
            error!(artifact = %id, file = %file_name(id), "Configured artifact is missing from storage");
            return Err(DownloadError::ArtifactMissing(id.to_string()));
        }

        match self.store.increment_downloads(id).await {
            Ok(true) => {}
            Ok(false) => {
                error!(artifact = %id, "No counter row for configured artifact");
                return Err(DownloadError::CounterWriteFailed(format!(
                    "no counter for {id}"
                )));
            }
            Err(e) => {
                error!(artifact = %id, error = %e, "Failed to increment download counter");
                return Err(e.into());
            }
        }

        let body = self.artifacts.open(id).await.map_err(|e| {
            error!(artifact = %id, error = %e, "Failed to open artifact after counting");
            DownloadError::Stream(e)
        })?;

        info!(artifact = %id, fingerprint = fingerprint.unwrap_or("-"), "Download started");
        Ok(body)
    }
}

/// Requester address: first `X-Forwarded-For` hop when trusted, else the peer.
fn remote_addr(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> Option<IpAddr> {
    if trust_forwarded {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse().ok());
        if forwarded.is_some() {
            return forwarded;
        }
    }
    peer.map(|p| p.ip())
}

fn parse_json(body: &Bytes) -> DownloadRequest {
    if body.is_empty() {
        return DownloadRequest::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        warn!(error = %e, "Unparseable download request body");
        DownloadRequest::default()
    })
}

/// Read the token from a JSON body, or from a urlencoded form as posted by
/// the captcha widgets themselves.
async fn read_request(request: Request) -> DownloadRequest {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        return match Form::<DownloadRequest>::from_request(request, &()).await {
            Ok(Form(form)) => form,
            Err(e) => {
                warn!(error = %e, "Unparseable download form");
                DownloadRequest::default()
            }
        };
    }

    match Bytes::from_request(request, &()).await {
        Ok(body) => parse_json(&body),
        Err(e) => {
            warn!(error = %e, "Unreadable download request body");
            DownloadRequest::default()
        }
    }
}

/// Pass artifact chunks through, recording the outcome once the transfer
/// completes or fails. A client that hangs up early records nothing.
fn track_transfer(id: String, stream: ByteStream) -> impl Stream<Item = std::io::Result<Bytes>> + Send {
    futures_util::stream::unfold(Some(stream), move |inner| {
        let id = id.clone();
        async move {
            let mut inner = inner?;
            match inner.next().await {
                Some(Ok(chunk)) => Some((Ok(chunk), Some(inner))),
                Some(Err(e)) => {
                    error!(artifact = %id, error = %e, "Artifact stream failed mid-transfer");
                    crate::metrics::record_download(&id, "download_error");
                    Some((Err(e), None))
                }
                None => {
                    crate::metrics::record_download(&id, "ok");
                    None
                }
            }
        }
    })
}

/// POST /download/:id
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    peer: Option<ConnectInfo<SocketAddr>>,
    ctx: Option<Extension<IdentityContext>>,
    headers: HeaderMap,
    request: Request,
) -> Response {
    let request = read_request(request).await;
    let remote = remote_addr(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.server.trust_forwarded_for,
    );
    let fingerprint = ctx.as_ref().and_then(|Extension(c)| c.fingerprint_value());

    let artifact = match state
        .downloads
        .download(&id, &request.token, remote, fingerprint)
        .await
    {
        Ok(artifact) => artifact,
        Err(e) => {
            crate::metrics::record_download(&id, e.error_code());
            return e.into_response();
        }
    };

    let stream = track_transfer(id.clone(), artifact.stream);
    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/zip"));
    if let Ok(v) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name(&id))) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    if let Some(len) = artifact.len {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    response
}
