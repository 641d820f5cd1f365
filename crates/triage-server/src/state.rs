//! Shared application state

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use triage_classifiers::{build_classifier, Classifier};
use triage_store::PredictionStore;
use triage_telemetry::MetricsAggregator;

use crate::config::ServiceConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServiceConfig>,

    /// Classifier adapter
    pub classifier: Arc<dyn Classifier>,

    /// Durable prediction records
    pub store: PredictionStore,

    /// Process-local counters and gauges
    pub metrics: Arc<MetricsAggregator>,
}

impl AppState {
    /// Assemble state from already-built components
    pub fn new(
        config: ServiceConfig,
        classifier: Arc<dyn Classifier>,
        store: PredictionStore,
        metrics: MetricsAggregator,
    ) -> Self {
        Self {
            config: Arc::new(config),
            classifier,
            store,
            metrics: Arc::new(metrics),
        }
    }

    /// Initialize application state from configuration
    pub async fn from_config(config: ServiceConfig) -> Result<Self> {
        info!("Initializing application state");

        let classifier = build_classifier(&config.classifier, &config.categories)?;

        let store = PredictionStore::open(&config.storage)?;
        info!("Prediction store holds {} records", store.count().await?);

        let metrics = MetricsAggregator::new(&config.categories, config.metrics.clone());
        info!("Tracking categories: {:?}", metrics.categories());

        Ok(Self::new(config, classifier, store, metrics))
    }
}
