//! Request Middleware
//!
//! Cross-cutting layers wrapped around every route: request timing and
//! analytics, panic recovery, per-client rate limiting, CORS and security
//! headers.

use std::any::Any;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use tracing::{error, warn};
use uuid::Uuid;

use super::handlers::AppState;
use crate::error::{internal_error_response, ApiError};

pub const RESPONSE_TIME_HEADER: &str = "x-response-time-ms";
pub const SLOW_REQUEST_MS: u64 = 1_200;

/// Number of tracked clients above which expired windows are dropped.
const LIMITER_PRUNE_THRESHOLD: usize = 10_000;

const SECURITY_HEADERS: [(&str, &str); 9] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-permitted-cross-domain-policies", "none"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
];

// == Request Observation ==
/// Marks a response produced by panic recovery; carries the panic message.
#[derive(Debug, Clone)]
pub struct InternalFailure(pub String);

/// Whether a request to `path` is reported as `api.request`.
pub fn is_tracked_path(path: &str) -> bool {
    path.starts_with("/api/") && path != "/api/health"
}

/// Times the request, stamps `x-response-time-ms` and reports it.
///
/// Requests slower than [`SLOW_REQUEST_MS`] are logged at `warn!`. Responses
/// carrying an [`InternalFailure`] are sent to error reporting.
pub async fn observe_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = Uuid::new_v4().to_string();

    let mut response = next.run(request).await;

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = response.status().as_u16();
    let slow = duration_ms > SLOW_REQUEST_MS;

    if let Some(InternalFailure(message)) = response.extensions_mut().remove::<InternalFailure>() {
        error!(%method, %path, request_id = %request_id, panic = %message, "unhandled failure");
        state.telemetry.capture_exception(
            &message,
            json!({ "path": path, "method": method, "requestId": request_id }),
        );
    }

    response
        .headers_mut()
        .insert(RESPONSE_TIME_HEADER, HeaderValue::from(duration_ms));

    if slow {
        warn!(
            %method,
            %path,
            status_code = status,
            duration_ms,
            "slow_request_detected"
        );
    }

    if is_tracked_path(&path) {
        state.telemetry.track(
            "api.request",
            json!({
                "method": method,
                "path": path,
                "statusCode": status,
                "durationMs": duration_ms,
                "requestId": request_id,
                "level": if slow { "warn" } else { "info" },
            }),
        );
    }

    response
}

// == Panic Recovery ==
/// Renders a panic as the generic `INTERNAL_ERROR` response.
///
/// Used with `CatchPanicLayer::custom`; the message rides along in an
/// [`InternalFailure`] extension for [`observe_request`].
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    let mut response = internal_error_response();
    response.extensions_mut().insert(InternalFailure(message));
    response
}

// == Rate Limiting ==
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of one [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the client's window restarts
    pub reset_after: Duration,
}

impl RateDecision {
    fn reset_secs(&self) -> u64 {
        self.reset_after.as_secs_f64().ceil() as u64
    }
}

/// Fixed-window request counter per client key.
#[derive(Debug)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// Allows `max` requests per client in each `window`.
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts a request from `key` and decides whether it may proceed.
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if windows.len() >= LIMITER_PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        let allowed = entry.count < self.max;
        if allowed {
            entry.count += 1;
        }

        RateDecision {
            allowed,
            limit: self.max,
            remaining: self.max.saturating_sub(entry.count),
            reset_after: self.window.saturating_sub(now.duration_since(entry.started)),
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Client key: the tail of a bearer credential, else the forwarded-for
/// chain, else the socket address.
pub fn rate_limit_key(headers: &HeaderMap, client_ip: Option<&str>) -> String {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("Bearer "))
    {
        let chars: Vec<char> = auth.chars().collect();
        let suffix: String = chars[chars.len().saturating_sub(16)..].iter().collect();
        return format!("auth:{}", suffix);
    }

    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        return forwarded.to_string();
    }

    client_ip.unwrap_or("unknown").to_string()
}

/// Rejects clients over their window with `429 RATE_LIMITED`.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let key = rate_limit_key(request.headers(), client_ip.as_deref());
    let decision = state.limiter.check(&key);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!(client = %key, "rate limit exceeded");
        ApiError::RateLimited {
            retry_after_secs: decision.reset_secs(),
        }
        .into_response()
    };

    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(decision.reset_secs()));
    if !decision.allowed {
        headers.insert(header::RETRY_AFTER, HeaderValue::from(decision.reset_secs()));
    }
    response
}

// == Cross-Origin and Security Headers ==
/// Credentialed CORS for the single browser origin `origin`.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match HeaderValue::from_str(origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(e) => {
            warn!(error = %e, origin, "APP_BASE_URL is not a valid origin, CORS disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Adds the static security headers unless a handler already set them.
pub fn security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SECURITY_HEADERS.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}
