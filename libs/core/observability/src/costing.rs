//! Cost-engine metrics.

use metrics::{counter, gauge, histogram};
use std::collections::HashMap;
use std::time::Instant;

/// Cost metrics recorder
pub struct CostMetrics;

impl CostMetrics {
    /// Record one completed operation (`projected`, `actual`, `spec`, ...)
    pub fn record_estimate(operation: &str, service: &str, outcome: &str) {
        counter!(
            "cost_estimates_total",
            "operation" => operation.to_string(),
            "service" => service.to_string(),
            "outcome" => outcome.to_string()
        )
        .increment(1);
    }

    /// Record a $0 estimate caused by missing pricing
    pub fn record_pricing_miss(service: &str) {
        counter!("cost_pricing_misses_total", "service" => service.to_string()).increment(1);

        tracing::debug!(service = service, "Pricing miss");
    }

    /// Record a rejected request
    pub fn record_error(operation: &str, kind: &str) {
        counter!(
            "cost_errors_total",
            "operation" => operation.to_string(),
            "kind" => kind.to_string()
        )
        .increment(1);
    }

    /// Set per-kind counts and savings for the last recommendation batch
    pub fn set_recommendations(
        count_by_kind: &HashMap<String, usize>,
        savings_by_kind: &HashMap<String, f64>,
    ) {
        for (kind, count) in count_by_kind {
            gauge!("cost_recommendations_last_batch", "kind" => kind.clone()).set(*count as f64);
        }
        for (kind, savings) in savings_by_kind {
            gauge!("cost_potential_savings_usd", "kind" => kind.clone()).set(*savings);
        }

        tracing::info!(
            kinds = count_by_kind.len(),
            total = count_by_kind.values().sum::<usize>(),
            "Recommendation metrics updated"
        );
    }
}

/// Timer guard for automatic duration recording.
///
/// Records the duration when `stop()` is called or when dropped.
pub struct EstimateTimer {
    start: Instant,
    operation: String,
    service: String,
    stopped: bool,
}

impl EstimateTimer {
    pub fn new(operation: &str, service: &str) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.to_string(),
            service: service.to_string(),
            stopped: false,
        }
    }

    /// Stop the timer and record the duration. Returns duration in milliseconds.
    pub fn stop(&mut self) -> u64 {
        if self.stopped {
            return 0;
        }
        self.stopped = true;

        let duration = self.start.elapsed();

        histogram!(
            "cost_estimate_duration_seconds",
            "operation" => self.operation.clone(),
            "service" => self.service.clone()
        )
        .record(duration.as_secs_f64());

        duration.as_millis() as u64
    }
}

impl Drop for EstimateTimer {
    fn drop(&mut self) {
        if !self.stopped {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_records_once() {
        let mut timer = EstimateTimer::new("projected", "ebs");
        timer.stop();
        assert_eq!(timer.stop(), 0);
    }
}
