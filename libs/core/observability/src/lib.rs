//! Observability utilities for the cost engine.
//!
//! This crate provides:
//! - Prometheus metrics recording and text export
//! - Cost-engine metrics (estimates, pricing misses, recommendations)
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, render_metrics, CostMetrics, EstimateTimer};
//!
//! init_metrics()?;
//!
//! let timer = EstimateTimer::new("projected", "ec2");
//! CostMetrics::record_estimate("projected", "ec2", "ok");
//! drop(timer);
//!
//! println!("{}", render_metrics());
//! ```

pub mod costing;

pub use costing::{CostMetrics, EstimateTimer};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Installs the global recorder on first call; later calls return the same handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Prometheus text exposition of everything recorded so far
pub fn render_metrics() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

/// Register metric descriptions for documentation
fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    describe_counter!(
        "cost_estimates_total",
        "Cost operations by operation, service and outcome"
    );
    describe_histogram!(
        "cost_estimate_duration_seconds",
        "Cost operation duration in seconds"
    );
    describe_counter!(
        "cost_pricing_misses_total",
        "Estimates that returned $0 because pricing was unavailable"
    );
    describe_counter!(
        "cost_errors_total",
        "Rejected cost requests by error kind"
    );
    describe_gauge!(
        "cost_recommendations_last_batch",
        "Recommendations produced by the last batch, by kind"
    );
    describe_gauge!(
        "cost_potential_savings_usd",
        "Estimated monthly savings of the last recommendation batch, by kind"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_after_init() {
        init_metrics().unwrap();
        // Second call returns the existing handle
        init_metrics().unwrap();

        CostMetrics::record_estimate("projected", "ec2", "ok");
        let rendered = render_metrics();
        assert!(rendered.contains("cost_estimates_total"));
    }
}
