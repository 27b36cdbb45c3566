//! Request metrics for the aggregation API
//!
//! Each [`ApiMetrics`] owns its own Prometheus registry, so several API
//! instances (one per test, say) never collide on metric names.

use crate::error::{AdminError, Result};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

const DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0];

#[derive(Clone)]
pub struct ApiMetrics {
    registry: Registry,
    requests: IntCounterVec,
    failures: IntCounterVec,
    duration: HistogramVec,
}

impl ApiMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("fedadmin_requests_total", "Total API requests by operation"),
            &["operation"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new(
                "fedadmin_request_failures_total",
                "Failed API requests by operation and error kind",
            ),
            &["operation", "kind"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "fedadmin_request_duration_seconds",
                "API request duration in seconds",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["operation"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            failures,
            duration,
        })
    }

    /// Record one finished request
    pub fn observe<T>(&self, operation: &str, elapsed: Duration, result: &Result<T>) {
        self.requests.with_label_values(&[operation]).inc();
        self.duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());

        if let Err(err) = result {
            self.failures
                .with_label_values(&[operation, err.kind().as_str()])
                .inc();
        }
    }

    pub fn requests(&self, operation: &str) -> u64 {
        self.requests.with_label_values(&[operation]).get()
    }

    pub fn failures(&self, operation: &str, kind: &str) -> u64 {
        self.failures.with_label_values(&[operation, kind]).get()
    }

    /// Prometheus text exposition of every metric
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| AdminError::Task(e.to_string()))
    }
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics").finish_non_exhaustive()
    }
}
