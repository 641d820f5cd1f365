//! Service configuration

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::path::Path;
use triage_classifiers::ClassifierConfig;
use triage_core::default_categories;
use triage_store::StoreConfig;
use triage_telemetry::MetricsConfig;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Categories registered with the metrics aggregator at startup
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Classifier backing `/api/predict`
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Prediction storage
    #[serde(default)]
    pub storage: StoreConfig,

    /// Metrics aggregation
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Cross-origin access for browser clients
    #[serde(default)]
    pub cors: CorsConfig,
}

impl ServiceConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            Self::from_yaml(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(database) = &cli.database {
            config.storage.path = database.clone();
        }
        if let Some(model) = &cli.model {
            config.classifier = ClassifierConfig::LinearModel { path: model.clone() };
        }
        if cli.reset_storage {
            config.storage.reset_on_startup = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.categories.is_empty() {
            anyhow::bail!("at least one category must be configured");
        }
        if let Some(blank) = self.categories.iter().find(|c| c.trim().is_empty()) {
            anyhow::bail!("category names must not be blank (got {:?})", blank);
        }
        Ok(())
    }

    /// `listen:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            categories: default_categories(),
            classifier: ClassifierConfig::default(),
            storage: StoreConfig::default(),
            metrics: MetricsConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Accept requests from any origin
    #[serde(default = "default_true")]
    pub allow_any_origin: bool,

    /// Origins accepted when `allow_any_origin` is off
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_any_origin: true,
            allowed_origins: Vec::new(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;
    use triage_telemetry::{AccuracyBasis, UnknownCategoryPolicy};

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ServiceConfig::from_yaml("{}").unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.categories, vec!["bug", "enhancement", "question"]);
        assert!(!config.storage.reset_on_startup);
        assert!(config.cors.allow_any_origin);
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
listen: 127.0.0.1
port: 8088
categories: [bug, enhancement, question, docs]
classifier:
  type: linear_model
  path: ./models/issues
storage:
  path: /var/lib/triage/predictions.db
  reset_on_startup: true
metrics:
  unknown_categories: reject
  accuracy_basis: predictions
cors:
  allow_any_origin: false
  allowed_origins: ["http://localhost:3000"]
"#;
        let config = ServiceConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.port, 8088);
        assert_eq!(config.categories.len(), 4);
        assert!(matches!(config.classifier, ClassifierConfig::LinearModel { .. }));
        assert!(config.storage.reset_on_startup);
        assert_eq!(config.metrics.unknown_categories, UnknownCategoryPolicy::Reject);
        assert_eq!(config.metrics.accuracy_basis, AccuracyBasis::Predictions);
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_empty_categories_rejected() {
        assert!(ServiceConfig::from_yaml("categories: []").is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.yaml");
        std::fs::write(&path, "port: 7000\nstorage:\n  path: file.db\n").unwrap();

        let cli = Cli::try_parse_from([
            "triage-server",
            "--port",
            "7100",
            "--model",
            "/models/issues",
            "--reset-storage",
        ])
        .unwrap();
        let config = ServiceConfig::load(path.to_str().unwrap(), &cli).unwrap();

        assert_eq!(config.port, 7100);
        assert_eq!(config.storage.path, PathBuf::from("file.db"));
        assert!(config.storage.reset_on_startup);
        assert!(matches!(
            config.classifier,
            ClassifierConfig::LinearModel { ref path } if path == &PathBuf::from("/models/issues")
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cli = Cli::try_parse_from(["triage-server"]).unwrap();
        let config = ServiceConfig::load("/nonexistent/triage.yaml", &cli).unwrap();
        assert_eq!(config.port, 5000);
    }
}
