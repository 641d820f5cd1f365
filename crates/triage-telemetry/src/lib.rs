//! Triage Telemetry
//!
//! Prediction metrics for the triage service.
//!
//! Provides:
//! - Per-category prediction, correct and incorrect counters
//! - Last-confidence and accuracy gauges
//! - Prometheus text exposition for scraping

pub mod metrics;

pub use metrics::{
    AccuracyBasis, CategoryCounts, MetricsAggregator, MetricsConfig, MetricsCounts,
    UnknownCategoryPolicy,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::{MetricsAggregator, MetricsConfig};
}
