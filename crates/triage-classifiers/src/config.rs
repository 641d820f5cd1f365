//! Configuration for classifiers and model loading

use crate::classifier::Classifier;
use crate::keyword::KeywordClassifier;
use crate::linear::LinearModelClassifier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use triage_core::Result;

/// Which classifier backs the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierConfig {
    /// Built-in keyword lexicon over the configured categories
    Keyword {
        /// Extra keywords per category, appended to the built-in lists
        #[serde(default)]
        keywords: HashMap<String, Vec<String>>,
    },

    /// Pre-trained linear model loaded from a directory
    LinearModel {
        /// Directory holding `model.json` and `model.safetensors`
        path: PathBuf,
    },
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::Keyword {
            keywords: HashMap::new(),
        }
    }
}

/// Instantiate the configured classifier.
///
/// `categories` seeds the keyword classifier; a loaded model brings its own
/// labels, and any that are not in `categories` are reported at `warn`.
pub fn build_classifier(
    config: &ClassifierConfig,
    categories: &[String],
) -> Result<Arc<dyn Classifier>> {
    let classifier: Arc<dyn Classifier> = match config {
        ClassifierConfig::Keyword { keywords } => {
            Arc::new(KeywordClassifier::with_keywords(categories, keywords)?)
        }
        ClassifierConfig::LinearModel { path } => {
            let classifier = LinearModelClassifier::load(path)?;
            for label in classifier.labels() {
                if !categories.contains(label) {
                    warn!(
                        "Model label '{}' is not a configured category; it will be handled by the unknown-category policy",
                        label
                    );
                }
            }
            Arc::new(classifier)
        }
    };

    info!(
        "Classifier '{}' ready with labels {:?}",
        classifier.name(),
        classifier.labels()
    );
    Ok(classifier)
}
