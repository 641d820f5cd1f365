//! Prediction and correction metrics
//!
//! Per-category counters live in atomics so that concurrent requests never
//! lose increments. Every update is mirrored into a Prometheus recorder owned
//! by the aggregator, which renders the exposition text for scraping.
//!
//! Metrics are process-local: they start from zero on every restart and are
//! not rebuilt from stored predictions.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use triage_core::{Error, Result};

/// Content type of [`MetricsAggregator::snapshot`] output
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub const PREDICTIONS_TOTAL: &str = "predictions_total";
pub const CORRECT_PREDICTIONS: &str = "correct_predictions_total";
pub const INCORRECT_PREDICTIONS: &str = "incorrect_predictions_total";
pub const PREDICTION_CONFIDENCE: &str = "prediction_confidence";
pub const ACCURACY: &str = "accuracy";

const CATEGORY_LABEL: &str = "category";

/// What to do with a category that was not configured at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Start tracking the category on first sight
    #[default]
    Register,
    /// Fail the operation with a configuration error
    Reject,
}

/// Denominator used for the accuracy gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyBasis {
    /// correct / (correct + incorrect)
    #[default]
    Reviewed,
    /// correct / total predictions
    Predictions,
}

/// Aggregator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub unknown_categories: UnknownCategoryPolicy,

    #[serde(default)]
    pub accuracy_basis: AccuracyBasis,
}

#[derive(Default)]
struct CategoryCounters {
    predictions: AtomicU64,
    correct: AtomicU64,
    incorrect: AtomicU64,
}

impl CategoryCounters {
    fn counts(&self) -> CategoryCounts {
        CategoryCounts {
            predictions: self.predictions.load(Ordering::Relaxed),
            correct: self.correct.load(Ordering::Relaxed),
            incorrect: self.incorrect.load(Ordering::Relaxed),
        }
    }
}

/// Process-wide prediction metrics.
///
/// Constructed once at startup and shared with request handlers; there is no
/// global recorder.
pub struct MetricsAggregator {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    categories: RwLock<HashMap<String, Arc<CategoryCounters>>>,
    config: MetricsConfig,
    /// Guards recompute-and-set of the accuracy gauge
    accuracy: Mutex<Option<f64>>,
    last_confidence: Mutex<Option<f64>>,
}

impl MetricsAggregator {
    /// Create an aggregator with `categories` pre-registered at zero
    pub fn new(categories: &[String], config: MetricsConfig) -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let aggregator = Self {
            recorder,
            handle,
            categories: RwLock::new(HashMap::new()),
            config,
            accuracy: Mutex::new(None),
            last_confidence: Mutex::new(None),
        };

        aggregator.with_recorder(|| {
            metrics::describe_counter!(PREDICTIONS_TOTAL, "Total number of predictions");
            metrics::describe_counter!(CORRECT_PREDICTIONS, "Number of correct predictions");
            metrics::describe_counter!(INCORRECT_PREDICTIONS, "Number of incorrect predictions");
            // Holds the most recent confidence, not an average.
            metrics::describe_gauge!(
                PREDICTION_CONFIDENCE,
                "Confidence score of the most recent prediction"
            );
            metrics::describe_gauge!(ACCURACY, "Overall prediction accuracy");
        });

        {
            let mut registered = aggregator.categories.write();
            for category in categories {
                registered
                    .entry(category.clone())
                    .or_insert_with(|| aggregator.register_series(category));
            }
        }

        aggregator
    }

    fn with_recorder<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(&self.recorder, f)
    }

    /// Create zeroed series for a category so it shows up before first use
    fn register_series(&self, category: &str) -> Arc<CategoryCounters> {
        self.with_recorder(|| {
            for name in [PREDICTIONS_TOTAL, CORRECT_PREDICTIONS, INCORRECT_PREDICTIONS] {
                metrics::counter!(name, CATEGORY_LABEL => category.to_string()).absolute(0);
            }
        });
        Arc::default()
    }

    /// Resolve a category's counters, applying the unknown-category policy
    fn counters(&self, category: &str) -> Result<Arc<CategoryCounters>> {
        if let Some(counters) = self.categories.read().get(category) {
            return Ok(Arc::clone(counters));
        }

        match self.config.unknown_categories {
            UnknownCategoryPolicy::Reject => Err(Error::config(format!(
                "unknown category '{category}'"
            ))),
            UnknownCategoryPolicy::Register => {
                let mut categories = self.categories.write();
                let counters = categories.entry(category.to_string()).or_insert_with(|| {
                    warn!("Registering category '{}' seen at runtime", category);
                    self.register_series(category)
                });
                Ok(Arc::clone(counters))
            }
        }
    }

    /// Check that `category` can be recorded, registering it if allowed.
    ///
    /// Lets callers fail before doing durable work.
    pub fn admit(&self, category: &str) -> Result<()> {
        self.counters(category).map(|_| ())
    }

    /// Count a prediction and overwrite the last-confidence gauge
    pub fn record_prediction(&self, category: &str, confidence: f64) -> Result<()> {
        let counters = self.counters(category)?;
        counters.predictions.fetch_add(1, Ordering::Relaxed);
        *self.last_confidence.lock() = Some(confidence);

        self.with_recorder(|| {
            metrics::counter!(PREDICTIONS_TOTAL, CATEGORY_LABEL => category.to_string())
                .increment(1);
            metrics::gauge!(PREDICTION_CONFIDENCE).set(confidence);
        });

        debug!(category, confidence, "Prediction recorded");
        Ok(())
    }

    /// Count a correction against the originally predicted category and
    /// recompute accuracy
    pub fn record_correction(&self, original_category: &str, was_correct: bool) -> Result<()> {
        let counters = self.counters(original_category)?;
        let name = if was_correct {
            counters.correct.fetch_add(1, Ordering::Relaxed);
            CORRECT_PREDICTIONS
        } else {
            counters.incorrect.fetch_add(1, Ordering::Relaxed);
            INCORRECT_PREDICTIONS
        };

        self.with_recorder(|| {
            metrics::counter!(name, CATEGORY_LABEL => original_category.to_string()).increment(1);
        });

        self.update_accuracy();
        debug!(category = original_category, was_correct, "Correction recorded");
        Ok(())
    }

    fn update_accuracy(&self) {
        let mut accuracy = self.accuracy.lock();

        let counts = self.counts_inner();
        let correct = counts.total_correct();
        let denominator = match self.config.accuracy_basis {
            AccuracyBasis::Reviewed => correct + counts.total_incorrect(),
            AccuracyBasis::Predictions => counts.total_predictions(),
        };

        if denominator > 0 {
            let value = correct as f64 / denominator as f64;
            self.with_recorder(|| metrics::gauge!(ACCURACY).set(value));
            *accuracy = Some(value);
        }
    }

    fn counts_inner(&self) -> MetricsCounts {
        let categories = self
            .categories
            .read()
            .iter()
            .map(|(name, counters)| (name.clone(), counters.counts()))
            .collect();

        MetricsCounts {
            categories,
            accuracy: None,
            last_confidence: None,
        }
    }

    /// Structured copy of the current counters and gauges
    pub fn counts(&self) -> MetricsCounts {
        MetricsCounts {
            accuracy: *self.accuracy.lock(),
            last_confidence: *self.last_confidence.lock(),
            ..self.counts_inner()
        }
    }

    /// Last computed accuracy; `None` until its denominator is non-zero
    pub fn accuracy(&self) -> Option<f64> {
        *self.accuracy.lock()
    }

    /// Tracked categories, sorted
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.categories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Render all counters and gauges in Prometheus text exposition format
    pub fn snapshot(&self) -> String {
        self.handle.render()
    }
}

/// Counters for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub predictions: u64,
    pub correct: u64,
    pub incorrect: u64,
}

/// Point-in-time copy of the aggregator state
#[derive(Debug, Clone)]
pub struct MetricsCounts {
    pub categories: BTreeMap<String, CategoryCounts>,
    pub accuracy: Option<f64>,
    pub last_confidence: Option<f64>,
}

impl MetricsCounts {
    pub fn total_predictions(&self) -> u64 {
        self.categories.values().map(|c| c.predictions).sum()
    }

    pub fn total_correct(&self) -> u64 {
        self.categories.values().map(|c| c.correct).sum()
    }

    pub fn total_incorrect(&self) -> u64 {
        self.categories.values().map(|c| c.incorrect).sum()
    }

    pub fn category(&self, name: &str) -> CategoryCounts {
        self.categories.get(name).copied().unwrap_or_default()
    }
}
