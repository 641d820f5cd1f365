//! Text tokenization shared by the bag-of-words classifiers

use regex::Regex;
use triage_core::{Error, Result};

/// Default token pattern: runs of two or more word characters
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Lowercasing regex tokenizer
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    /// Create a tokenizer from a regex pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::classifier(format!("Invalid token pattern '{pattern}': {e}")))?;
        Ok(Self { pattern })
    }

    /// Split text into lowercase tokens
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.pattern
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_TOKEN_PATTERN).expect("default token pattern is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tokens() {
        let tokenizer = Tokenizer::default();
        assert_eq!(
            tokenizer.tokens("Login CRASHES on submit, a b!"),
            vec!["login", "crashes", "on", "submit"]
        );
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Tokenizer::new("(unclosed").is_err());
    }
}
