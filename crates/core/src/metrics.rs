//! Prometheus metrics for the work queue.
//!
//! Registration happens in the server, which owns the registry.

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts};

/// Assignment attempts by outcome ("assigned" or an error kind).
pub static ASSIGNMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "printqueue_assignments_total",
            "Total printer assignment attempts",
        ),
        &["result"],
    )
    .unwrap()
});

/// Completion attempts by outcome ("completed" or an error kind).
pub static COMPLETIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "printqueue_completions_total",
            "Total printer assignment completions",
        ),
        &["result"],
    )
    .unwrap()
});

/// Queue position handed out on successful assignment.
pub static QUEUE_POSITION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "printqueue_queue_position",
            "Jobs already active on the chosen printer at assignment time",
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0]),
    )
    .unwrap()
});

/// All core metrics, for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ASSIGNMENTS_TOTAL.clone()),
        Box::new(COMPLETIONS_TOTAL.clone()),
        Box::new(QUEUE_POSITION.clone()),
    ]
}
