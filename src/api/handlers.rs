//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderName},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::cache::{ReadThroughCache, RemoteStore, UpstashStore};
use crate::compliance::{mandatory_disclaimers, sanitize_narrative};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::fallback::{social_fallback, trust_fallback};
use crate::intelligence::{IntelligenceClient, IntelligenceError};
use crate::models::{
    is_news_feed_stale, validate_symbol, AckResponse, AnnotatedResponse, DataResponse,
    DependencyStatus, DonationWebhook, FeedResponse, HealthResponse, NewsItem, PortfolioPlan,
    PortfolioRequest, QuizSubmitRequest, RiskProfile, SipPlan, SipRequest, SocialSnapshot,
    TrustScore,
};
use crate::telemetry::Telemetry;
use crate::webhook::{verify_webhook_signature, SIGNATURE_HEADER};

use super::middleware::RateLimiter;

pub const TRUST_SCORE_CACHE_SECONDS: u64 = 6 * 60 * 60;
pub const NEWS_CACHE_SECONDS: u64 = 15 * 60;
pub const SOCIAL_CACHE_SECONDS: u64 = 10 * 60;

/// `cache-control` header attached to cached reads.
pub type CacheHeaders = [(HeaderName, String); 1];

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide read-through cache
    pub cache: Arc<ReadThroughCache>,
    pub intelligence: Arc<IntelligenceClient>,
    pub telemetry: Telemetry,
    /// Donation webhook HMAC secret
    pub webhook_secret: Option<Arc<str>>,
    /// Per-client request windows
    pub limiter: Arc<RateLimiter>,
    /// Browser origin allowed by CORS
    pub cors_origin: Arc<str>,
    pub started_at: Instant,
}

impl AppState {
    /// Creates a new AppState from its collaborators.
    pub fn new(cache: ReadThroughCache, intelligence: IntelligenceClient) -> Self {
        let defaults = Config::default();
        Self {
            cache: Arc::new(cache),
            intelligence: Arc::new(intelligence),
            telemetry: Telemetry::disabled(),
            webhook_secret: None,
            limiter: Arc::new(RateLimiter::new(
                defaults.rate_limit_max,
                Duration::from_secs(defaults.rate_limit_window_secs),
            )),
            cors_origin: Arc::from(defaults.app_base_url),
            started_at: Instant::now(),
        }
    }

    /// Sets the donation webhook secret.
    pub fn with_webhook_secret(mut self, secret: impl Into<Arc<str>>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Replaces the limiter with one allowing `max` requests per `window`.
    pub fn with_rate_limit(mut self, max: u32, window: Duration) -> Self {
        self.limiter = Arc::new(RateLimiter::new(max, window));
        self
    }

    pub fn with_cors_origin(mut self, origin: impl Into<Arc<str>>) -> Self {
        self.cors_origin = origin.into();
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// An unusable remote cache URL is logged and the cache runs memory-only.
    pub fn from_config(config: &Config) -> std::result::Result<Self, IntelligenceError> {
        let remote: Option<Arc<dyn RemoteStore>> = match config.remote_cache() {
            Some((url, token)) => match UpstashStore::new(reqwest::Client::new(), url, token) {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!(error = %e, "remote cache disabled");
                    None
                }
            },
            None => None,
        };

        let mut state = Self::new(
            ReadThroughCache::new(remote),
            IntelligenceClient::from_config(config)?,
        )
        .with_telemetry(Telemetry::from_config(config))
        .with_rate_limit(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
        )
        .with_cors_origin(config.app_base_url.as_str());
        state.webhook_secret = config.webhook_secret.as_deref().map(Arc::from);
        Ok(state)
    }
}

/// Builds the `cache-control` header for a response cached `seconds` long.
pub fn cache_headers(seconds: u64) -> CacheHeaders {
    [(
        header::CACHE_CONTROL,
        format!(
            "public, max-age={}, s-maxage={}, stale-while-revalidate={}",
            seconds / 2,
            seconds,
            seconds
        ),
    )]
}

fn symbol_param(raw: &str) -> Result<&str> {
    validate_symbol(raw).map_err(ApiError::InvalidSymbol)
}

/// Handler for GET /api/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let dependencies = DependencyStatus {
        remote_cache_configured: state.cache.has_remote(),
        webhook_secret_configured: state.webhook_secret.is_some(),
        telemetry_configured: state.telemetry.is_enabled(),
        error_reporting_configured: state.telemetry.reports_errors(),
    };

    Json(HealthResponse::healthy(
        state.started_at.elapsed().as_secs(),
        dependencies,
        state.cache.stats().await,
    ))
}

/// Handler for GET /api/stocks/:symbol/trust-score
///
/// Falls back to a deterministic estimate when the upstream fails and
/// nothing has been cached for the symbol yet.
pub async fn trust_score_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<(CacheHeaders, Json<DataResponse<TrustScore>>)> {
    let symbol = symbol_param(&raw)?;
    let key = format!("trust:{}", symbol);
    let intelligence = &state.intelligence;

    let (mut data, stale) = match state
        .cache
        .with_cache(&key, TRUST_SCORE_CACHE_SECONDS, move || {
            intelligence.fetch_trust_score(symbol)
        })
        .await
    {
        Ok(cached) => (cached.data, cached.stale),
        Err(e) => {
            warn!(symbol, error = %e, "trust score unavailable, using fallback estimate");
            (trust_fallback(symbol), true)
        }
    };

    data.stale_data = stale || data.stale_data;
    data.explanations = data
        .explanations
        .iter()
        .map(|text| sanitize_narrative(text))
        .collect();
    data.disclaimers = mandatory_disclaimers();

    state.telemetry.track(
        "trust_score.viewed",
        json!({ "symbol": symbol, "staleData": data.stale_data }),
    );

    Ok((
        cache_headers(TRUST_SCORE_CACHE_SECONDS),
        Json(DataResponse::new(data)),
    ))
}

/// Handler for GET /api/stocks/:symbol/news
///
/// The feed is also flagged stale when its newest article is too old.
pub async fn news_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<(CacheHeaders, Json<FeedResponse<Vec<NewsItem>>>)> {
    let symbol = symbol_param(&raw)?;
    let key = format!("news:{}", symbol);
    let intelligence = &state.intelligence;

    let cached = state
        .cache
        .with_cache(&key, NEWS_CACHE_SECONDS, move || intelligence.fetch_news(symbol))
        .await?;

    let stale_data = cached.stale || is_news_feed_stale(&cached.data, Utc::now());

    Ok((
        cache_headers(NEWS_CACHE_SECONDS),
        Json(FeedResponse {
            data: cached.data,
            stale_data,
            disclaimers: mandatory_disclaimers(),
        }),
    ))
}

/// Handler for GET /api/stocks/:symbol/social
pub async fn social_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<(CacheHeaders, Json<AnnotatedResponse<SocialSnapshot>>)> {
    let symbol = symbol_param(&raw)?;
    let key = format!("social:{}", symbol);
    let intelligence = &state.intelligence;

    let data = match state
        .cache
        .with_cache(&key, SOCIAL_CACHE_SECONDS, move || {
            intelligence.fetch_social_snapshot(symbol)
        })
        .await
    {
        Ok(cached) => {
            let mut data = cached.data;
            data.stale_data = cached.stale || data.stale_data;
            data
        }
        Err(e) => {
            warn!(symbol, error = %e, "social snapshot unavailable, using fallback estimate");
            social_fallback(symbol)
        }
    };

    Ok((
        cache_headers(SOCIAL_CACHE_SECONDS),
        Json(AnnotatedResponse {
            data,
            disclaimers: mandatory_disclaimers(),
        }),
    ))
}

/// Handler for POST /api/quiz/submit
pub async fn quiz_submit_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QuizSubmitRequest>, JsonRejection>,
) -> Result<Json<DataResponse<RiskProfile>>> {
    let Json(req) = payload?;
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidPayload(error_msg));
    }

    let mut profile = state.intelligence.score_quiz(&req.answers).await?;
    profile.disclaimers = mandatory_disclaimers();

    info!(persona = ?profile.persona, "quiz scored");
    state.telemetry.track(
        "quiz.submitted",
        json!({
            "modelVersion": profile.model_version,
            "riskScore": profile.risk_score,
            "persona": profile.persona,
        }),
    );

    Ok(Json(DataResponse::new(profile)))
}

/// Handler for POST /api/portfolio/generate
pub async fn portfolio_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PortfolioRequest>, JsonRejection>,
) -> Result<Json<DataResponse<PortfolioPlan>>> {
    let Json(req) = payload?;
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidPayload(error_msg));
    }

    let mut plan = state
        .intelligence
        .generate_portfolio(req.risk_persona, req.amount, req.horizon_months)
        .await?;
    plan.disclaimers = mandatory_disclaimers();

    state.telemetry.track(
        "portfolio.generated",
        json!({
            "riskPersona": req.risk_persona,
            "amount": req.amount,
            "horizonMonths": req.horizon_months,
        }),
    );

    Ok(Json(DataResponse::new(plan)))
}

/// Handler for POST /api/sip/generate
pub async fn sip_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SipRequest>, JsonRejection>,
) -> Result<Json<DataResponse<SipPlan>>> {
    let Json(req) = payload?;
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidPayload(error_msg));
    }

    let mut plan = state
        .intelligence
        .generate_sip_plan(req.monthly_budget, req.risk_persona, req.horizon_months)
        .await?;
    plan.disclaimers = mandatory_disclaimers();

    state.telemetry.track(
        "sip.generated",
        json!({
            "riskPersona": req.risk_persona,
            "monthlyBudget": req.monthly_budget,
            "horizonMonths": req.horizon_months,
        }),
    );

    Ok(Json(DataResponse::new(plan)))
}

/// Handler for POST /api/donate/webhook
///
/// The signature covers the raw body bytes, so the body is only parsed after
/// verification.
pub async fn donate_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AckResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::InvalidSignature("Signature missing".to_string()))?;

    if !verify_webhook_signature(&body, signature, state.webhook_secret.as_deref()) {
        return Err(ApiError::InvalidSignature(
            "Webhook signature mismatch".to_string(),
        ));
    }

    let hook: DonationWebhook = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidPayload(e.to_string()))?;

    info!(event = %hook.event, payment_id = ?hook.payment_id(), "donation webhook received");
    state.telemetry.track(
        "donation.webhook_received",
        json!({ "event": hook.event, "paymentId": hook.payment_id() }),
    );

    Ok(Json(AckResponse { ok: true }))
}
