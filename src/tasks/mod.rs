//! Background Tasks Module
//!
//! Contains work that runs outside the request/response path.
//!
//! # Tasks
//! - Detached: fire-and-forget futures whose failures are logged, never raised

mod detached;

pub use detached::spawn_detached;
