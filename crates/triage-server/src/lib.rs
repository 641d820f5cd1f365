//! Triage Server
//!
//! HTTP front end for issue classification. Predictions are classified,
//! persisted and counted; reviewer corrections feed per-category accuracy
//! metrics exposed in Prometheus text format.

pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use cli::{Cli, LogFormat};
pub use config::{CorsConfig, ServiceConfig};
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
