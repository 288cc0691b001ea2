//! API Module
//!
//! HTTP handlers and routing for the gateway REST API.
//!
//! # Endpoints
//! - `GET /api/health` - Health check with cache statistics
//! - `GET /api/stocks/:symbol/{trust-score,news,social}` - Cached stock insights
//! - `POST /api/quiz/submit` - Risk quiz scoring
//! - `POST /api/portfolio/generate` and `POST /api/sip/generate` - Plans
//! - `POST /api/donate/webhook` - Donation events
//!
//! Every route sits behind the layers in [`middleware`].

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
