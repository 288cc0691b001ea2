//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Optional collaborators stay disabled while their variables are unset.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Web app origin allowed by CORS
    pub app_base_url: String,
    /// Requests allowed per client within one rate-limit window
    pub rate_limit_max: u32,
    /// Rate-limit window, in seconds
    pub rate_limit_window_secs: u64,
    /// Base URL of the intelligence service
    pub intelligence_base_url: String,
    /// Token sent to the intelligence service in `x-internal-token`
    pub api_internal_token: String,
    /// Request timeout for intelligence calls, in seconds
    pub intelligence_timeout_secs: u64,
    /// Remote cache tier REST endpoint
    pub remote_cache_url: Option<String>,
    /// Remote cache tier bearer token
    pub remote_cache_token: Option<String>,
    /// Shared secret for donation webhook signatures
    pub webhook_secret: Option<String>,
    /// Product analytics project key
    pub posthog_key: Option<String>,
    /// Product analytics host
    pub posthog_host: String,
    /// Error reporting DSN
    pub sentry_dsn: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `API_PORT` - HTTP server port (default: 4000)
    /// - `APP_BASE_URL` - CORS origin (default: http://localhost:3000)
    /// - `RATE_LIMIT_MAX` / `RATE_LIMIT_WINDOW_SECS` - Per-client limit (default: 150 per 60s)
    /// - `INTELLIGENCE_BASE_URL` - Analytics service (default: http://localhost:8000)
    /// - `API_INTERNAL_TOKEN` - Internal service token (default: local-dev-token)
    /// - `INTELLIGENCE_TIMEOUT_SECS` - Upstream timeout (default: 10)
    /// - `UPSTASH_REDIS_REST_URL` / `UPSTASH_REDIS_REST_TOKEN` - Remote cache tier
    /// - `RAZORPAY_WEBHOOK_SECRET` - Donation webhook secret
    /// - `POSTHOG_KEY` / `POSTHOG_HOST` - Telemetry sink
    /// - `SENTRY_DSN` - Error reporting
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed("API_PORT").unwrap_or(defaults.server_port),
            app_base_url: non_empty("APP_BASE_URL").unwrap_or(defaults.app_base_url),
            rate_limit_max: parsed("RATE_LIMIT_MAX").unwrap_or(defaults.rate_limit_max),
            rate_limit_window_secs: parsed("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or(defaults.rate_limit_window_secs),
            intelligence_base_url: non_empty("INTELLIGENCE_BASE_URL")
                .unwrap_or(defaults.intelligence_base_url),
            api_internal_token: non_empty("API_INTERNAL_TOKEN")
                .unwrap_or(defaults.api_internal_token),
            intelligence_timeout_secs: parsed("INTELLIGENCE_TIMEOUT_SECS")
                .unwrap_or(defaults.intelligence_timeout_secs),
            remote_cache_url: non_empty("UPSTASH_REDIS_REST_URL"),
            remote_cache_token: non_empty("UPSTASH_REDIS_REST_TOKEN"),
            webhook_secret: non_empty("RAZORPAY_WEBHOOK_SECRET"),
            posthog_key: non_empty("POSTHOG_KEY"),
            posthog_host: non_empty("POSTHOG_HOST").unwrap_or(defaults.posthog_host),
            sentry_dsn: non_empty("SENTRY_DSN"),
        }
    }

    /// URL and token of the remote cache tier, when both are set.
    pub fn remote_cache(&self) -> Option<(&str, &str)> {
        match (&self.remote_cache_url, &self.remote_cache_token) {
            (Some(url), Some(token)) => Some((url.as_str(), token.as_str())),
            _ => None,
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 4000,
            app_base_url: "http://localhost:3000".to_string(),
            rate_limit_max: 150,
            rate_limit_window_secs: 60,
            intelligence_base_url: "http://localhost:8000".to_string(),
            api_internal_token: "local-dev-token".to_string(),
            intelligence_timeout_secs: 10,
            remote_cache_url: None,
            remote_cache_token: None,
            webhook_secret: None,
            posthog_key: None,
            posthog_host: "https://app.posthog.com".to_string(),
            sentry_dsn: None,
        }
    }
}
