//! Classifier trait and common types

use async_trait::async_trait;
use triage_core::{Error, Result};

/// Trait for all classifiers.
///
/// A classifier maps free text to one of the categories it was built for,
/// together with the probability it assigns to that category.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given text
    async fn classify(&self, text: &str) -> Result<ClassificationResult>;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Categories this classifier can produce, in model order
    fn labels(&self) -> &[String];
}

/// Result of classification
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// Classification label
    pub label: String,

    /// Confidence score (0.0-1.0): the maximum class probability
    pub score: f32,

    /// Additional metadata
    pub metadata: ClassificationMetadata,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl ClassificationResult {
    /// Create a new classification result
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
            metadata: ClassificationMetadata::default(),
            latency_us: 0,
        }
    }

    /// Build a result from a probability distribution over `labels`.
    ///
    /// The label is the arg-max; ties resolve to the earliest label.
    pub fn from_distribution(labels: &[String], probabilities: &[f32]) -> Result<Self> {
        if labels.is_empty() || labels.len() != probabilities.len() {
            return Err(Error::classifier(format!(
                "distribution has {} probabilities for {} labels",
                probabilities.len(),
                labels.len()
            )));
        }

        let mut best = 0;
        for (idx, p) in probabilities.iter().enumerate() {
            if !p.is_finite() {
                return Err(Error::classifier(format!(
                    "non-finite probability for label '{}'",
                    labels[idx]
                )));
            }
            if *p > probabilities[best] {
                best = idx;
            }
        }

        Ok(Self {
            label: labels[best].clone(),
            score: probabilities[best].clamp(0.0, 1.0),
            metadata: ClassificationMetadata {
                all_scores: Some(
                    labels
                        .iter()
                        .cloned()
                        .zip(probabilities.iter().copied())
                        .collect(),
                ),
                ..Default::default()
            },
            latency_us: 0,
        })
    }

    /// Attach the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.metadata.model = Some(model.into());
        self
    }

    /// Attach the measured latency
    pub fn with_latency_us(mut self, latency_us: u64) -> Self {
        self.latency_us = latency_us;
        self
    }
}

/// Metadata about classification
#[derive(Debug, Clone, Default)]
pub struct ClassificationMetadata {
    /// Model name or version
    pub model: Option<String>,

    /// All class scores (for multi-class classifiers)
    pub all_scores: Option<Vec<(String, f32)>>,
}
