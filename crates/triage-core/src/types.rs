//! Core types for triage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categories registered when no explicit list is configured
pub const DEFAULT_CATEGORIES: [&str; 3] = ["bug", "enhancement", "question"];

/// Owned copy of [`DEFAULT_CATEGORIES`]
pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Identifier of a prediction record.
///
/// Fresh identifiers are random 128-bit UUIDs (v4). Identifiers received
/// from clients are accepted verbatim, so lookups with malformed ids simply
/// miss instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionId(String);

impl PredictionId {
    /// Allocate a new random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PredictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PredictionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PredictionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One classification event and its optional human correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Unique record identifier
    pub id: PredictionId,

    /// Original issue text
    pub issue_body: String,

    /// Label produced by the classifier
    pub predicted_label: String,

    /// Label supplied by a reviewer, absent until corrected
    pub corrected_label: Option<String>,

    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Prediction {
    /// Create an uncorrected record with a fresh identifier
    pub fn new(issue_body: impl Into<String>, predicted_label: impl Into<String>) -> Self {
        Self {
            id: PredictionId::generate(),
            issue_body: issue_body.into(),
            predicted_label: predicted_label.into(),
            corrected_label: None,
            timestamp: Utc::now(),
        }
    }

    /// Whether a correction has been recorded
    pub fn is_corrected(&self) -> bool {
        self.corrected_label.is_some()
    }

    /// Whether the reviewer agreed with the classifier.
    ///
    /// `None` until the record is corrected.
    pub fn was_correct(&self) -> Option<bool> {
        self.corrected_label
            .as_deref()
            .map(|label| label == self.predicted_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_uuids() {
        let a = PredictionId::generate();
        let b = PredictionId::generate();

        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_new_prediction_is_uncorrected() {
        let prediction = Prediction::new("login crashes on submit", "bug");

        assert_eq!(prediction.predicted_label, "bug");
        assert!(!prediction.is_corrected());
        assert_eq!(prediction.was_correct(), None);
    }

    #[test]
    fn test_was_correct() {
        let mut prediction = Prediction::new("please add dark mode", "bug");

        prediction.corrected_label = Some("enhancement".to_string());
        assert_eq!(prediction.was_correct(), Some(false));

        prediction.corrected_label = Some("bug".to_string());
        assert_eq!(prediction.was_correct(), Some(true));
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = PredictionId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
