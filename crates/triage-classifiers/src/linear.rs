//! Pre-trained bag-of-words softmax classifier
//!
//! A model directory contains two files:
//! - `model.json`: manifest with the ordered `labels`, the ordered
//!   `vocabulary` and an optional `token_pattern`
//! - `model.safetensors`: a `weight` tensor of shape `[vocabulary, labels]`
//!   and a `bias` tensor of shape `[labels]`
//!
//! Inference computes `softmax(counts · weight + bias)` where `counts` is the
//! term-frequency vector of the input text over the vocabulary.

use crate::classifier::{ClassificationResult, Classifier};
use crate::tokenize::{Tokenizer, DEFAULT_TOKEN_PATTERN};
use candle_core::{DType, Device, Tensor, D};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use triage_core::{Error, Result};

/// Manifest file name inside a model directory
pub const MANIFEST_FILE: &str = "model.json";

/// Weights file name inside a model directory
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// Model manifest (`model.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Model name reported in classification metadata
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Output categories, in weight column order
    pub labels: Vec<String>,

    /// Vocabulary, in weight row order
    pub vocabulary: Vec<String>,

    /// Token regex used when vectorising text
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
}

fn default_model_name() -> String {
    "linear-bow".to_string()
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn candle_err(context: &str) -> impl Fn(candle_core::Error) -> Error + '_ {
    move |e| Error::classifier(format!("{context}: {e}"))
}

struct LinearModel {
    manifest: ModelManifest,
    index: HashMap<String, usize>,
    tokenizer: Tokenizer,
    weight: Tensor,
    bias: Tensor,
    device: Device,
}

impl LinearModel {
    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut counts = vec![0f32; self.manifest.vocabulary.len()];
        for token in self.tokenizer.tokens(text) {
            if let Some(&idx) = self.index.get(&token) {
                counts[idx] += 1.0;
            }
        }
        counts
    }

    fn predict_proba(&self, text: &str) -> Result<Vec<f32>> {
        let counts = self.vectorize(text);
        let width = counts.len();

        let x = Tensor::from_vec(counts, (1, width), &self.device)
            .map_err(candle_err("Failed to build input tensor"))?;
        let logits = x
            .matmul(&self.weight)
            .and_then(|t| t.broadcast_add(&self.bias))
            .map_err(candle_err("Inference failed"))?;
        let probs = candle_nn::ops::softmax(&logits, D::Minus1)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(candle_err("Softmax failed"))?;

        Ok(probs)
    }
}

/// Classifier backed by a [`ModelManifest`] and Candle tensors
pub struct LinearModelClassifier {
    name: String,
    model: Arc<LinearModel>,
    source: PathBuf,
}

impl LinearModelClassifier {
    /// Load a model directory from disk
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);
        let weights_path = dir.join(WEIGHTS_FILE);

        if !manifest_path.exists() {
            return Err(Error::classifier(format!(
                "Model manifest does not exist: {}",
                manifest_path.display()
            )));
        }
        if !weights_path.exists() {
            return Err(Error::classifier(format!(
                "Model weights do not exist: {}",
                weights_path.display()
            )));
        }

        let manifest: ModelManifest = serde_json::from_str(&std::fs::read_to_string(&manifest_path)?)
            .map_err(|e| Error::classifier(format!("Invalid model manifest: {e}")))?;

        let device = Device::Cpu;
        let mut tensors = candle_core::safetensors::load(&weights_path, &device)
            .map_err(candle_err("Failed to load SafeTensors"))?;

        let weight = tensors
            .remove("weight")
            .ok_or_else(|| Error::classifier("Model weights are missing the 'weight' tensor"))?;
        let bias = tensors
            .remove("bias")
            .ok_or_else(|| Error::classifier("Model weights are missing the 'bias' tensor"))?;

        let classifier = Self::from_parts(manifest, weight, bias)?;
        tracing::info!(
            model = %classifier.name,
            labels = classifier.model.manifest.labels.len(),
            vocabulary = classifier.model.manifest.vocabulary.len(),
            "Loaded linear model from {}",
            dir.display()
        );

        Ok(Self {
            source: dir.to_path_buf(),
            ..classifier
        })
    }

    /// Build a classifier from an in-memory manifest and tensors
    pub fn from_parts(manifest: ModelManifest, weight: Tensor, bias: Tensor) -> Result<Self> {
        let vocab = manifest.vocabulary.len();
        let labels = manifest.labels.len();

        if labels == 0 {
            return Err(Error::classifier("Model manifest declares no labels"));
        }
        if weight.dims() != [vocab, labels] {
            return Err(Error::classifier(format!(
                "Weight shape {:?} does not match [vocabulary={vocab}, labels={labels}]",
                weight.dims()
            )));
        }
        if bias.dims() != [labels] {
            return Err(Error::classifier(format!(
                "Bias shape {:?} does not match [labels={labels}]",
                bias.dims()
            )));
        }

        let weight = weight
            .to_dtype(DType::F32)
            .map_err(candle_err("Failed to convert weights"))?;
        let bias = bias
            .to_dtype(DType::F32)
            .map_err(candle_err("Failed to convert bias"))?;

        let index = manifest
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, token)| (token.to_lowercase(), i))
            .collect();
        let tokenizer = Tokenizer::new(&manifest.token_pattern)?;

        Ok(Self {
            name: manifest.name.clone(),
            model: Arc::new(LinearModel {
                manifest,
                index,
                tokenizer,
                weight,
                bias,
                device: Device::Cpu,
            }),
            source: PathBuf::new(),
        })
    }

    /// Directory the model was loaded from (empty for in-memory models)
    pub fn source(&self) -> &Path {
        &self.source
    }
}

#[async_trait::async_trait]
impl Classifier for LinearModelClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();
        let model = Arc::clone(&self.model);
        let text = text.to_owned();

        let probabilities = tokio::task::spawn_blocking(move || model.predict_proba(&text))
            .await
            .map_err(|e| Error::classifier(format!("Inference task failed: {e}")))??;

        let result =
            ClassificationResult::from_distribution(&self.model.manifest.labels, &probabilities)?;

        Ok(result
            .with_model(self.name.clone())
            .with_latency_us(start.elapsed().as_micros() as u64))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &[String] {
        &self.model.manifest.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> ModelManifest {
        ModelManifest {
            name: "tiny".to_string(),
            labels: vec!["bug".into(), "enhancement".into()],
            vocabulary: vec!["crash".into(), "feature".into()],
            token_pattern: default_token_pattern(),
        }
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let weight = Tensor::zeros((3, 2), DType::F32, &Device::Cpu).unwrap();
        let bias = Tensor::zeros(2, DType::F32, &Device::Cpu).unwrap();

        let err = LinearModelClassifier::from_parts(manifest(), weight, bias)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Classifier(_)));
    }

    #[test]
    fn test_vectorize_counts_known_tokens() {
        let weight = Tensor::zeros((2, 2), DType::F32, &Device::Cpu).unwrap();
        let bias = Tensor::zeros(2, DType::F32, &Device::Cpu).unwrap();
        let classifier = LinearModelClassifier::from_parts(manifest(), weight, bias).unwrap();

        let counts = classifier.model.vectorize("Crash crash, unknown FEATURE");
        assert_eq!(counts, vec![2.0, 1.0]);
    }

    #[tokio::test]
    async fn test_zero_weights_give_uniform_distribution() {
        let weight = Tensor::zeros((2, 2), DType::F32, &Device::Cpu).unwrap();
        let bias = Tensor::zeros(2, DType::F32, &Device::Cpu).unwrap();
        let classifier = LinearModelClassifier::from_parts(manifest(), weight, bias).unwrap();

        let result = classifier.classify("anything").await.unwrap();
        assert_eq!(result.label, "bug");
        assert!((result.score - 0.5).abs() < 1e-6);
        assert_eq!(result.metadata.model.as_deref(), Some("tiny"));
    }
}
