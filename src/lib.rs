//! Trust Gateway - HTTP gateway for stock trust insights
//!
//! Fronts the intelligence service with a two-tier read-through cache,
//! deterministic fallbacks and compliance disclaimers.

pub mod api;
pub mod cache;
pub mod compliance;
pub mod config;
pub mod error;
pub mod fallback;
pub mod intelligence;
pub mod models;
pub mod tasks;
pub mod telemetry;
pub mod webhook;

pub use api::{create_router, AppState};
pub use config::Config;
