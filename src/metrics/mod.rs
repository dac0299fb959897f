//! Prometheus metrics for the tubelens API
//!
//! This module provides metrics tracking for:
//! - API: requests by endpoint and status, request duration
//! - YouTube: upstream calls by resource and outcome
//! - Sessions: cache hits/misses, active session count
//! - Models: which backend served each inference (model vs fallback)
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};
use std::sync::{Mutex, OnceLock};

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all service metrics
struct ServiceMetrics {
    api_requests: CounterVec,
    api_duration: HistogramVec,
    youtube_calls: CounterVec,
    cache_lookups: CounterVec,
    active_sessions: Gauge,
    model_inferences: CounterVec,
}

/// Global storage for service metrics
static SERVICE_METRICS: OnceLock<ServiceMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

/// Serializes registration so concurrent callers return only once it is done
static METRICS_INIT_LOCK: Mutex<()> = Mutex::new(());

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, subsequent metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = tubelens::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = METRICS_INIT_LOCK.lock().unwrap_or_else(|p| p.into_inner());

    // Prevent double initialization
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = ServiceMetrics {
        api_requests: register_counter_vec!(
            "tubelens_api_requests_total",
            "Total API requests by endpoint and status",
            &["endpoint", "status"]
        )?,
        api_duration: register_histogram_vec!(
            "tubelens_api_request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
        )?,
        youtube_calls: register_counter_vec!(
            "tubelens_youtube_api_calls_total",
            "Total YouTube Data API calls by resource and outcome",
            &["resource", "outcome"]
        )?,
        cache_lookups: register_counter_vec!(
            "tubelens_session_cache_lookups_total",
            "Session cache lookups by result (hit, miss)",
            &["result"]
        )?,
        active_sessions: register_gauge!(
            "tubelens_active_sessions",
            "Number of live sessions in the session store"
        )?,
        model_inferences: register_counter_vec!(
            "tubelens_model_inferences_total",
            "Inference calls by model and backend",
            &["model", "backend"]
        )?,
    };

    SERVICE_METRICS
        .set(metrics)
        .map_err(|_| "Service metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    SERVICE_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record API request
pub fn record_api_request(endpoint: &str, status: u16, duration_secs: f64) {
    let Some(m) = SERVICE_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.api_requests
        .with_label_values(&[endpoint, &status_str])
        .inc();
    m.api_duration
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

/// Record an upstream YouTube API call
pub fn record_youtube_call(resource: &str, outcome: &str) {
    if let Some(m) = SERVICE_METRICS.get() {
        m.youtube_calls.with_label_values(&[resource, outcome]).inc();
    }
}

/// Record a session cache lookup
pub fn record_cache_lookup(hit: bool) {
    if let Some(m) = SERVICE_METRICS.get() {
        m.cache_lookups
            .with_label_values(&[if hit { "hit" } else { "miss" }])
            .inc();
    }
}

/// Update the live session gauge
pub fn set_active_sessions(count: usize) {
    if let Some(m) = SERVICE_METRICS.get() {
        m.active_sessions.set(count as f64);
    }
}

/// Record which backend served an inference batch
pub fn record_model_inference(model: &str, backend: &str, count: usize) {
    if count == 0 {
        return;
    }
    if let Some(m) = SERVICE_METRICS.get() {
        m.model_inferences
            .with_label_values(&[model, backend])
            .inc_by(count as f64);
    }
}

// ============================================================================
// Tests
// ============================================================================
