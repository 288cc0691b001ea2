//! Remote Tier Module
//!
//! The optional shared key/value store behind the in-process table. The
//! production implementation speaks the Redis-over-REST dialect
//! (`GET {base}/get/{key}`, `POST {base}/setex/{key}/{ttl}/{value}`) with a
//! bearer token.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

// == Remote Error ==
/// Failures talking to the remote tier. Never surfaced to cache callers.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The configured base URL cannot carry path segments
    #[error("invalid remote store url: {0}")]
    InvalidUrl(String),

    /// Transport-level failure
    #[error("remote store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("remote store returned {0}")]
    Status(StatusCode),
}

// == Remote Store Trait ==
/// A shared key/value store with server-side expiry.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the raw value for `key`, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, RemoteError>;

    /// Stores `value` under `key`, expiring after `ttl_seconds`.
    async fn set_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<(), RemoteError>;
}

#[derive(Debug, Deserialize)]
struct RestResult {
    #[serde(default)]
    result: Option<String>,
}

// == Upstash Store ==
/// [`RemoteStore`] backed by a Redis REST endpoint.
#[derive(Debug, Clone)]
pub struct UpstashStore {
    client: Client,
    base_url: Url,
    token: String,
}

impl UpstashStore {
    /// Creates a store for `base_url`, authenticating with `token`.
    pub fn new(client: Client, base_url: &str, token: impl Into<String>) -> Result<Self, RemoteError> {
        let base_url =
            Url::parse(base_url).map_err(|e| RemoteError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    /// Builds `{base}/{segments...}` with each segment percent-encoded.
    fn command_url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl RemoteStore for UpstashStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RemoteError> {
        let url = self.command_url(&["get", key])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }

        let body: RestResult = response.json().await?;
        Ok(body.result)
    }

    async fn set_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<(), RemoteError> {
        let ttl = ttl_seconds.to_string();
        let url = self.command_url(&["setex", key, &ttl, value])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> UpstashStore {
        UpstashStore::new(Client::new(), base, "token").unwrap()
    }

    #[test]
    fn test_command_url_encodes_segments() {
        let url = store("https://kv.example.com")
            .command_url(&["setex", "trust:TCS.NS", "600", "{\"a\":\"b/c\"}"])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://kv.example.com/setex/trust:TCS.NS/600/%7B%22a%22:%22b%2Fc%22%7D"
        );
    }

    #[test]
    fn test_command_url_trailing_slash() {
        let url = store("https://kv.example.com/").command_url(&["get", "k"]).unwrap();
        assert_eq!(url.as_str(), "https://kv.example.com/get/k");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = UpstashStore::new(Client::new(), "not a url", "token");
        assert!(matches!(result, Err(RemoteError::InvalidUrl(_))));
    }

    #[test]
    fn test_rest_result_null() {
        let body: RestResult = serde_json::from_str(r#"{"result":null}"#).unwrap();
        assert!(body.result.is_none());
    }
}
