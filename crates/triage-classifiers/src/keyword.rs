//! Lexicon-based issue classifier
//!
//! Used when no trained model is configured. Each category owns a keyword
//! list; the probability of a category is its keyword hit count with add-one
//! smoothing, normalised over all categories.

use crate::classifier::{ClassificationResult, Classifier};
use aho_corasick::AhoCorasick;
use std::collections::HashMap;
use std::time::Instant;
use triage_core::{Error, Result};

const MODEL_NAME: &str = "issue-keywords";

fn builtin_keywords(category: &str) -> &'static [&'static str] {
    match category {
        "bug" => &[
            "bug",
            "crash",
            "error",
            "exception",
            "fail",
            "broken",
            "panic",
            "regression",
            "stack trace",
            "traceback",
            "doesn't work",
            "does not work",
            "not working",
            "unexpected",
            "wrong",
        ],
        "enhancement" => &[
            "feature",
            "enhancement",
            "add support",
            "would be nice",
            "improve",
            "improvement",
            "request",
            "proposal",
            "suggest",
            "allow",
            "option to",
            "ability to",
            "should support",
        ],
        "question" => &[
            "how do i",
            "how to",
            "how can",
            "question",
            "is it possible",
            "what is",
            "why does",
            "can i",
            "documentation",
            "help",
            "?",
        ],
        _ => &[],
    }
}

struct CategoryMatcher {
    label: String,
    matcher: AhoCorasick,
}

pub struct KeywordClassifier {
    name: String,
    labels: Vec<String>,
    matchers: Vec<CategoryMatcher>,
}

impl KeywordClassifier {
    /// Create a classifier over `categories` using the built-in lexicons
    pub fn new(categories: &[String]) -> Result<Self> {
        Self::with_keywords(categories, &HashMap::new())
    }

    /// Create a classifier with extra keywords appended per category
    pub fn with_keywords(
        categories: &[String],
        extra: &HashMap<String, Vec<String>>,
    ) -> Result<Self> {
        if categories.is_empty() {
            return Err(Error::config("keyword classifier needs at least one category"));
        }

        let mut matchers = Vec::with_capacity(categories.len());
        for category in categories {
            let mut keywords: Vec<String> = builtin_keywords(category)
                .iter()
                .map(|k| k.to_string())
                .collect();
            if let Some(more) = extra.get(category) {
                keywords.extend(more.iter().cloned());
            }

            let matcher = AhoCorasick::builder()
                .ascii_case_insensitive(true)
                .build(&keywords)
                .map_err(|e| {
                    Error::classifier(format!(
                        "Failed to build keyword matcher for '{category}': {e}"
                    ))
                })?;

            matchers.push(CategoryMatcher {
                label: category.clone(),
                matcher,
            });
        }

        Ok(Self {
            name: MODEL_NAME.to_string(),
            labels: categories.to_vec(),
            matchers,
        })
    }

    /// Smoothed probability distribution over the configured labels
    fn distribution(&self, text: &str) -> Vec<f32> {
        let hits: Vec<f32> = self
            .matchers
            .iter()
            .map(|m| m.matcher.find_iter(text).count() as f32 + 1.0)
            .collect();
        let total: f32 = hits.iter().sum();
        hits.into_iter().map(|h| h / total).collect()
    }
}

#[async_trait::async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();

        let probabilities = self.distribution(text);
        let result = ClassificationResult::from_distribution(&self.labels, &probabilities)?;

        tracing::debug!(
            label = %result.label,
            score = result.score,
            categories = self.matchers.len(),
            "keyword classification"
        );

        Ok(result
            .with_model(MODEL_NAME)
            .with_latency_us(start.elapsed().as_micros() as u64))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::default_categories;

    #[tokio::test]
    async fn test_bug_report() {
        let classifier = KeywordClassifier::new(&default_categories()).unwrap();
        let result = classifier.classify("login crashes on submit").await.unwrap();

        assert_eq!(result.label, "bug");
        assert!(result.score > 1.0 / 3.0 && result.score <= 1.0);
    }

    #[tokio::test]
    async fn test_feature_request() {
        let classifier = KeywordClassifier::new(&default_categories()).unwrap();
        let result = classifier
            .classify("Feature request: it would be nice to add support for dark mode")
            .await
            .unwrap();

        assert_eq!(result.label, "enhancement");
    }

    #[tokio::test]
    async fn test_question() {
        let classifier = KeywordClassifier::new(&default_categories()).unwrap();
        let result = classifier
            .classify("How do I configure the proxy? Is it possible via env vars?")
            .await
            .unwrap();

        assert_eq!(result.label, "question");
    }

    #[tokio::test]
    async fn test_no_hits_is_uniform() {
        let classifier = KeywordClassifier::new(&default_categories()).unwrap();
        let result = classifier.classify("zzz").await.unwrap();

        assert_eq!(result.label, "bug");
        assert!((result.score - 1.0 / 3.0).abs() < 1e-6);
        let sum: f32 = result
            .metadata
            .all_scores
            .unwrap()
            .iter()
            .map(|(_, s)| s)
            .sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_extra_keywords_for_custom_category() {
        let categories = vec!["bug".to_string(), "docs".to_string()];
        let mut extra = HashMap::new();
        extra.insert(
            "docs".to_string(),
            vec!["readme".to_string(), "typo".to_string()],
        );
        let classifier = KeywordClassifier::with_keywords(&categories, &extra).unwrap();

        let result = classifier.classify("Typo in the README").await.unwrap();
        assert_eq!(result.label, "docs");
        assert_eq!(classifier.labels(), categories.as_slice());
    }

    #[test]
    fn test_empty_categories_rejected() {
        assert!(KeywordClassifier::new(&[]).is_err());
    }
}
