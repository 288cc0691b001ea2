//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use super::handlers::{
    donate_webhook_handler, health_handler, news_handler, portfolio_handler, quiz_submit_handler,
    sip_handler, social_handler, trust_score_handler, AppState,
};
use super::middleware::{cors_layer, handle_panic, observe_request, rate_limit, security_headers};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/health` - Liveness, dependency and cache status
/// - `GET /api/stocks/:symbol/trust-score` - Cached trust score
/// - `GET /api/stocks/:symbol/news` - Cached news feed
/// - `GET /api/stocks/:symbol/social` - Cached social snapshot
/// - `POST /api/quiz/submit` - Score a risk quiz
/// - `POST /api/portfolio/generate` - Educational portfolio plan
/// - `POST /api/sip/generate` - Educational SIP plan
/// - `POST /api/donate/webhook` - Signed donation events
///
/// # Middleware (outermost first)
/// - Tracing: Logs all requests
/// - Observation: `x-response-time-ms`, slow-request warnings, `api.request`
/// - Security headers
/// - CORS: Only `AppState::cors_origin`, with credentials
/// - Rate limiting: Per-client fixed window
/// - Panic recovery: `500 INTERNAL_ERROR`
pub fn create_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/stocks/:symbol/trust-score", get(trust_score_handler))
        .route("/api/stocks/:symbol/news", get(news_handler))
        .route("/api/stocks/:symbol/social", get(social_handler))
        .route("/api/quiz/submit", post(quiz_submit_handler))
        .route("/api/portfolio/generate", post(portfolio_handler))
        .route("/api/sip/generate", post(sip_handler))
        .route("/api/donate/webhook", post(donate_webhook_handler));

    with_middleware(routes, state)
}

/// Wraps `routes` in the gateway's middleware stack and binds `state`.
pub(crate) fn with_middleware(routes: Router<AppState>, state: AppState) -> Router {
    let routes = routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(cors_layer(&state.cors_origin));

    security_headers(routes)
        .layer(from_fn_with_state(state.clone(), observe_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
