//! Triage Store
//!
//! Durable storage for prediction records.
//!
//! Records live in a single SQLite table keyed by identifier. Each create or
//! correction is one write transaction; the connection is shared behind a
//! mutex and driven from blocking tasks so the async runtime never waits on
//! disk I/O.

pub mod config;
pub mod error;
pub mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use store::PredictionStore;
