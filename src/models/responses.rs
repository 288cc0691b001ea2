//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Standard success envelope: `{"data": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Response body for GET /api/stocks/:symbol/news
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse<T> {
    pub data: T,
    pub stale_data: bool,
    pub disclaimers: Vec<String>,
}

/// Response body for GET /api/stocks/:symbol/social
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedResponse<T> {
    pub data: T,
    pub disclaimers: Vec<String>,
}

/// Response body for POST /api/donate/webhook
#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// Which optional collaborators are configured.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStatus {
    pub remote_cache_configured: bool,
    pub webhook_secret_configured: bool,
    pub telemetry_configured: bool,
    pub error_reporting_configured: bool,
}

/// Response body for the health endpoint (GET /api/health)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status, always "ok" while the process serves requests
    pub status: String,
    pub service: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub dependencies: DependencyStatus,
    pub cache: CacheStats,
    /// Share of lookups answered from either cache tier
    pub cache_hit_rate: f64,
}

impl HealthResponse {
    /// Creates a healthy report stamped with the current time.
    pub fn healthy(uptime_seconds: u64, dependencies: DependencyStatus, cache: CacheStats) -> Self {
        Self {
            status: "ok".to_string(),
            service: "api-gateway".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds,
            dependencies,
            cache_hit_rate: cache.hit_rate(),
            cache,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Error message describing what went wrong
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
