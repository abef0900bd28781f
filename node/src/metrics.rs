//! # Prometheus Metrics
//!
//! Exposes operational metrics for the store service. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] with
//! the `tangle_store` prefix so they do not collide with any default global
//! registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::core::Collector;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use tangle_store::store::StoreOutcome;

/// Holds all Prometheus metric handles for the service.
///
/// Clone-friendly (prometheus handles are reference-counted) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct StoreMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Store requests received.
    pub store_requests_total: IntCounter,
    /// Store requests that ended with a transaction on the ledger.
    pub store_success_total: IntCounter,
    /// Failed store requests, labelled by failure kind.
    pub store_failures_total: IntCounterVec,
    /// Payload bytes successfully stored.
    pub stored_bytes_total: IntCounter,
    /// End-to-end pipeline latency in seconds.
    pub store_latency_seconds: Histogram,
}

impl StoreMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("tangle_store".into()), None)?;

        let store_requests_total = register(
            &registry,
            IntCounter::new("store_requests_total", "Total number of store requests received")?,
        )?;

        let store_success_total = register(
            &registry,
            IntCounter::new(
                "store_success_total",
                "Total number of files stored and anchored on the ledger",
            )?,
        )?;

        let store_failures_total = register(
            &registry,
            IntCounterVec::new(
                Opts::new("store_failures_total", "Total number of failed store requests"),
                &["kind"],
            )?,
        )?;

        let stored_bytes_total = register(
            &registry,
            IntCounter::new("stored_bytes_total", "Total payload bytes stored")?,
        )?;

        // Remote proof-of-work dominates, so the buckets reach into minutes.
        let store_latency_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "store_latency_seconds",
                    "End-to-end store pipeline latency in seconds",
                )
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
            )?,
        )?;

        Ok(Self {
            registry,
            store_requests_total,
            store_success_total,
            store_failures_total,
            stored_bytes_total,
            store_latency_seconds,
        })
    }

    /// Account for one finished request.
    pub fn observe(&self, outcome: &StoreOutcome, elapsed_secs: f64) {
        self.store_requests_total.inc();
        self.store_latency_seconds.observe(elapsed_secs);
        match &outcome.result {
            Ok(receipt) => {
                self.store_success_total.inc();
                self.stored_bytes_total.inc_by(receipt.stored_bytes as u64);
            }
            Err(e) => self.store_failures_total.with_label_values(&[e.kind()]).inc(),
        }
    }

    /// Account for a request whose body never made it into the pipeline.
    pub fn observe_rejection(&self) {
        self.store_requests_total.inc();
        self.store_failures_total
            .with_label_values(&["validation"])
            .inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn register<C: Collector + Clone + 'static>(
    registry: &Registry,
    collector: C,
) -> Result<C, prometheus::Error> {
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<StoreMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
