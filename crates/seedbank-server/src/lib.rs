//! HTTP facade for the Seedbank dataset & seed service.
//!
//! One process serves four concerns: event logging over Postgres, pool
//! loading with deterministic seeded selection, LLM-backed generation,
//! and seed resolution. Handlers share a database pool, the dataset
//! store (with its process-wide file lock registry), and the completion
//! backend through [`AppState`].

pub mod config;
pub mod error;
pub mod http;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use http::build_router;
pub use state::AppState;
