//! Prometheus metrics collection for macrogate.
//!
//! Metrics live in a process-wide registry and are exposed on a separate
//! `/metrics` listener. Recording before [`init`] is a no-op, so library code
//! and tests can call the helpers unconditionally.
//!
//! - `macrogate_gate_decisions_total{decision}` - Access gate outcomes
//! - `macrogate_downloads_total{artifact,result}` - Download attempts by outcome
//! - `macrogate_escalations_total` - Fingerprints banned by escalation
//! - `macrogate_challenge_duration_seconds{result}` - Captcha round-trip latency
//! - `macrogate_request_duration_seconds{route}` - HTTP handler latency

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

/// Gate decisions by outcome (allow, maintenance, or the deny reason).
pub static GATE_DECISIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Download attempts by artifact and result code.
pub static DOWNLOADS: OnceLock<IntCounterVec> = OnceLock::new();

/// Fingerprints promoted into the ban registry.
pub static ESCALATIONS: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Challenge verification latency.
pub static CHALLENGE_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Request latency by matched route.
pub static REQUEST_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before metrics are scraped.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(GATE_DECISIONS, IntCounterVec::new(
        Opts::new("macrogate_gate_decisions_total", "Access gate decisions by outcome"),
        &["decision"],
    ));
    register!(DOWNLOADS, IntCounterVec::new(
        Opts::new("macrogate_downloads_total", "Download attempts by artifact and result"),
        &["artifact", "result"],
    ));
    register!(ESCALATIONS, IntCounter::new(
        "macrogate_escalations_total",
        "Fingerprints banned by escalation",
    ));
    register!(CHALLENGE_LATENCY, HistogramVec::new(
        HistogramOpts::new("macrogate_challenge_duration_seconds", "Challenge verification latency")
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["result"],
    ));
    register!(REQUEST_LATENCY, HistogramVec::new(
        HistogramOpts::new("macrogate_request_duration_seconds", "HTTP request latency by route")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["route"],
    ));
}

/// Gather all metrics in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record an access gate decision.
#[inline]
pub fn record_gate_decision(decision: &str) {
    if let Some(c) = GATE_DECISIONS.get() {
        c.with_label_values(&[decision]).inc();
    }
}

/// Record the outcome of a download attempt.
#[inline]
pub fn record_download(artifact: &str, result: &str) {
    if let Some(c) = DOWNLOADS.get() {
        c.with_label_values(&[artifact, result]).inc();
    }
}

/// Record a fingerprint escalation.
#[inline]
pub fn record_escalation() {
    if let Some(c) = ESCALATIONS.get() {
        c.inc();
    }
}

/// Record a challenge verification round-trip.
#[inline]
pub fn record_challenge(passed: bool, duration_secs: f64) {
    if let Some(h) = CHALLENGE_LATENCY.get() {
        let result = if passed { "pass" } else { "fail" };
        h.with_label_values(&[result]).observe(duration_secs);
    }
}

/// Record handler latency for a route.
#[inline]
pub fn record_request(route: &str, duration_secs: f64) {
    if let Some(h) = REQUEST_LATENCY.get() {
        h.with_label_values(&[route]).observe(duration_secs);
    }
}
