//! Shared fixtures for API tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use triage_classifiers::{ClassificationResult, Classifier};
use triage_core::{default_categories, Error, Result};
use triage_server::{create_router, AppState, ServiceConfig};
use triage_store::PredictionStore;
use triage_telemetry::{MetricsAggregator, MetricsConfig};

/// Classifier returning a fixed label and score
pub struct MockClassifier {
    label: String,
    score: f32,
    labels: Vec<String>,
    call_count: AtomicU32,
}

impl MockClassifier {
    pub fn new(label: &str, score: f32) -> Self {
        Self {
            label: label.to_string(),
            score,
            labels: default_categories(),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassificationResult> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(ClassificationResult::new(self.label.clone(), self.score).with_model("mock"))
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Classifier that always errors
pub struct FailingClassifier {
    labels: Vec<String>,
}

impl FailingClassifier {
    pub fn new() -> Self {
        Self {
            labels: default_categories(),
        }
    }
}

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassificationResult> {
        Err(Error::classifier("model unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Build state around an in-memory store
pub fn test_state(classifier: Arc<dyn Classifier>, metrics: MetricsConfig) -> AppState {
    let config = ServiceConfig::default();
    let store = PredictionStore::in_memory().unwrap();
    let aggregator = MetricsAggregator::new(&config.categories, metrics);
    AppState::new(config, classifier, store, aggregator)
}

pub fn test_app(classifier: Arc<dyn Classifier>) -> (Router, AppState) {
    let state = test_state(classifier, MetricsConfig::default());
    (create_router(state.clone()), state)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

pub async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_metrics(app: &Router) -> String {
    let (status, bytes) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    String::from_utf8(bytes).unwrap()
}
