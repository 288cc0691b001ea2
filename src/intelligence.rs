//! Intelligence service client
//!
//! Thin HTTP client for the analytics service that computes trust scores,
//! sentiment, risk profiles and plans. Every call carries the internal token
//! in `x-internal-token`; non-success statuses become
//! [`IntelligenceError::Status`] with the upstream body attached.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::Config;
use crate::models::{
    NewsItem, PortfolioPlan, QuizAnswer, RiskPersona, RiskProfile, SipPlan, SocialSnapshot,
    TrustScore,
};

// == Error Type ==
/// Errors that can occur when calling the intelligence service
#[derive(Debug, Error)]
pub enum IntelligenceError {
    /// The configured base URL cannot carry path segments
    #[error("Invalid intelligence base url: {0}")]
    InvalidUrl(String),

    /// HTTP request failed or the body was not the expected JSON
    #[error("Intelligence request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Intelligence service error ({status}): {message}")]
    Status { status: StatusCode, message: String },
}

// == Client ==
/// Client for the intelligence service
#[derive(Debug, Clone)]
pub struct IntelligenceClient {
    client: Client,
    base_url: Url,
    internal_token: String,
}

impl IntelligenceClient {
    /// Creates a client with an explicit HTTP client.
    pub fn new(
        client: Client,
        base_url: &str,
        internal_token: impl Into<String>,
    ) -> Result<Self, IntelligenceError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| IntelligenceError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(IntelligenceError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client,
            base_url,
            internal_token: internal_token.into(),
        })
    }

    /// Creates a client whose requests time out after the configured limit.
    pub fn from_config(config: &Config) -> Result<Self, IntelligenceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.intelligence_timeout_secs))
            .build()?;
        Self::new(
            client,
            &config.intelligence_base_url,
            config.api_internal_token.clone(),
        )
    }

    /// Builds `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, IntelligenceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IntelligenceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, IntelligenceError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self
            .client
            .request(method, self.endpoint(segments)?)
            .header("x-internal-token", &self.internal_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IntelligenceError::Status { status, message });
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, IntelligenceError> {
        self.call::<T, ()>(Method::GET, segments, None).await
    }

    async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<T, IntelligenceError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call(Method::POST, segments, Some(body)).await
    }

    // == Stock Insights ==
    /// GET /v1/trust-score/{symbol}
    pub async fn fetch_trust_score(&self, symbol: &str) -> Result<TrustScore, IntelligenceError> {
        self.get(&["v1", "trust-score", symbol]).await
    }

    /// GET /v1/social/{symbol}
    pub async fn fetch_social_snapshot(
        &self,
        symbol: &str,
    ) -> Result<SocialSnapshot, IntelligenceError> {
        self.get(&["v1", "social", symbol]).await
    }

    /// GET /v1/news/{symbol}, newest article first
    pub async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>, IntelligenceError> {
        self.get(&["v1", "news", symbol]).await
    }

    // == Quiz and Plans ==
    /// POST /v1/quiz/score
    pub async fn score_quiz(&self, answers: &[QuizAnswer]) -> Result<RiskProfile, IntelligenceError> {
        self.post(&["v1", "quiz", "score"], &json!({ "answers": answers }))
            .await
    }

    /// POST /v1/portfolio/generate
    pub async fn generate_portfolio(
        &self,
        risk_persona: RiskPersona,
        amount: f64,
        horizon_months: u32,
    ) -> Result<PortfolioPlan, IntelligenceError> {
        let body = json!({
            "riskPersona": risk_persona,
            "amount": amount,
            "horizonMonths": horizon_months,
        });
        self.post(&["v1", "portfolio", "generate"], &body).await
    }

    /// POST /v1/sip/generate
    pub async fn generate_sip_plan(
        &self,
        monthly_budget: f64,
        risk_persona: RiskPersona,
        horizon_months: u32,
    ) -> Result<SipPlan, IntelligenceError> {
        let body = json!({
            "monthlyBudget": monthly_budget,
            "riskPersona": risk_persona,
            "horizonMonths": horizon_months,
        });
        self.post(&["v1", "sip", "generate"], &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> IntelligenceClient {
        IntelligenceClient::new(Client::new(), base, "token").unwrap()
    }

    #[test]
    fn test_endpoint_encodes_symbol() {
        let url = client("http://localhost:8000")
            .endpoint(&["v1", "trust-score", "M&M/NS"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/v1/trust-score/M&M%2FNS");
    }

    #[test]
    fn test_endpoint_with_base_path() {
        let url = client("http://intel.internal/api/").endpoint(&["v1", "news", "TCS.NS"]).unwrap();
        assert_eq!(url.as_str(), "http://intel.internal/api/v1/news/TCS.NS");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = IntelligenceClient::new(Client::new(), "localhost", "token");
        assert!(matches!(result, Err(IntelligenceError::InvalidUrl(_))));
    }

    #[test]
    fn test_status_error_message() {
        let err = IntelligenceError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: "down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Intelligence service error (502 Bad Gateway): down"
        );
    }
}
