//! Triage Core
//!
//! Core types, traits, and utilities shared across the triage components.
//!
//! This crate provides:
//! - The prediction record and its identifier
//! - Error types and result handling
//! - Default category vocabulary

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{default_categories, Prediction, PredictionId};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Prediction, PredictionId};
}
