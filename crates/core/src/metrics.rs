//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job outcomes and end-to-end duration
//! - Status polling
//! - Swallowed compensation and cleanup failures

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

/// Jobs total by outcome: "success", "client_error", "unavailable",
/// "upstream_failure", "timeout" or "internal".
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lego_jobs_total", "Total lego jobs handled"),
        &["outcome"],
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("lego_job_duration_seconds", "End-to-end duration of a lego job")
            .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 180.0, 300.0, 600.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Status polls per job until a terminal state or the deadline.
pub static POLL_ITERATIONS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "lego_poll_iterations",
            "Number of status polls issued per job",
        )
        .buckets(vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0]),
        &[],
    )
    .unwrap()
});

/// Compensation and cleanup actions that failed and were swallowed.
pub static COMPENSATION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lego_compensation_failures_total",
            "Best-effort cleanup actions that failed",
        ),
        &["action"], // "unload", "release", "temp_file"
    )
    .unwrap()
});

/// All core metrics, for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(POLL_ITERATIONS.clone()),
        Box::new(COMPENSATION_FAILURES.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        JOBS_TOTAL.with_label_values(&["success"]).inc();
        COMPENSATION_FAILURES.with_label_values(&["unload"]).inc();

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"lego_jobs_total".to_string()));
        assert!(names.contains(&"lego_compensation_failures_total".to_string()));
    }
}
