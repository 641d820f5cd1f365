//! Triage Classifiers
//!
//! Classifier adapters mapping issue text to a category and a confidence.
//!
//! Two implementations ship with the crate:
//! - [`KeywordClassifier`]: lexicon matching, needs no model files
//! - [`LinearModelClassifier`]: pre-trained bag-of-words softmax model
//!   evaluated with Candle on the CPU
//!
//! The confidence of a result is always the maximum class probability.

pub mod classifier;
pub mod config;
pub mod keyword;
pub mod linear;
pub mod tokenize;

pub use classifier::{ClassificationMetadata, ClassificationResult, Classifier};
pub use config::{build_classifier, ClassifierConfig};
pub use keyword::KeywordClassifier;
pub use linear::{LinearModelClassifier, ModelManifest};
pub use tokenize::Tokenizer;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{ClassificationResult, Classifier};
    pub use crate::keyword::KeywordClassifier;
    pub use crate::linear::LinearModelClassifier;
}
