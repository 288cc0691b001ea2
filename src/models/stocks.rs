//! Stock insight DTOs
//!
//! Shapes returned by the intelligence service for a single symbol. They are
//! cached as JSON, so every type round-trips through serde unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How long after its newest article a news feed counts as stale.
pub const NEWS_STALE_THRESHOLD_MS: i64 = 6 * 60 * 60 * 1000;

/// Trust band derived from a 0-100 trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrustBand {
    Strong,
    Watch,
    Risky,
    Avoid,
}

impl TrustBand {
    /// Maps a score onto its band: >= 80 strong, >= 60 watch, >= 40 risky.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            TrustBand::Strong
        } else if score >= 60.0 {
            TrustBand::Watch
        } else if score >= 40.0 {
            TrustBand::Risky
        } else {
            TrustBand::Avoid
        }
    }
}

/// Sub-scores that make up a trust score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustComponents {
    pub historical: f64,
    pub financial: f64,
    pub news: f64,
    pub market: f64,
    pub hype_penalty: f64,
}

/// Trust score for one symbol (GET /api/stocks/:symbol/trust-score).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustScore {
    pub symbol: String,
    pub as_of_date: String,
    pub trust_score: f64,
    pub trust_band: TrustBand,
    pub confidence: f64,
    #[serde(default)]
    pub limited_data: bool,
    #[serde(default)]
    pub stale_data: bool,
    pub components: TrustComponents,
    #[serde(default)]
    pub explanations: Vec<String>,
    #[serde(default)]
    pub disclaimers: Vec<String>,
}

/// One scored article in a symbol's news feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub symbol: String,
    pub source: String,
    pub title: String,
    pub url: String,
    pub published_at: String,
    pub sentiment: f64,
    pub confidence: f64,
    pub credibility_weight: f64,
    #[serde(default)]
    pub is_duplicate: bool,
}

/// Social sentiment snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSnapshot {
    pub symbol: String,
    pub as_of_date: String,
    pub bullish_pct: f64,
    pub bearish_pct: f64,
    pub hype_velocity: f64,
    pub confidence: f64,
    #[serde(default)]
    pub meme_risk_flag: bool,
    #[serde(default)]
    pub stale_data: bool,
}

/// Whether a newest-first news feed is too old to present as current.
///
/// Empty feeds and feeds whose newest `published_at` cannot be parsed are
/// stale.
pub fn is_news_feed_stale(news: &[NewsItem], now: DateTime<Utc>) -> bool {
    let Some(latest) = news.first() else {
        return true;
    };

    match DateTime::parse_from_rfc3339(&latest.published_at) {
        Ok(published) => {
            (now - published.with_timezone(&Utc)).num_milliseconds() > NEWS_STALE_THRESHOLD_MS
        }
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news_item(published_at: &str) -> NewsItem {
        NewsItem {
            id: "n1".to_string(),
            symbol: "RELIANCE.NS".to_string(),
            source: "moneycontrol.com".to_string(),
            title: "Reliance quarterly update".to_string(),
            url: "https://example.com/article".to_string(),
            published_at: published_at.to_string(),
            sentiment: 0.2,
            confidence: 71.0,
            credibility_weight: 0.85,
            is_duplicate: false,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-20T12:00:00.000Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_empty_feed_is_stale() {
        assert!(is_news_feed_stale(&[], now()));
    }

    #[test]
    fn test_recent_feed_is_fresh() {
        let feed = vec![news_item("2026-02-20T09:00:00.000Z")];
        assert!(!is_news_feed_stale(&feed, now()));
    }

    #[test]
    fn test_old_feed_is_stale() {
        let feed = vec![news_item("2026-02-20T02:00:00.000Z")];
        assert!(is_news_feed_stale(&feed, now()));
    }

    #[test]
    fn test_invalid_published_at_is_stale() {
        let feed = vec![news_item("not-a-date")];
        assert!(is_news_feed_stale(&feed, now()));
    }

    #[test]
    fn test_trust_band_thresholds() {
        assert_eq!(TrustBand::from_score(80.0), TrustBand::Strong);
        assert_eq!(TrustBand::from_score(79.99), TrustBand::Watch);
        assert_eq!(TrustBand::from_score(60.0), TrustBand::Watch);
        assert_eq!(TrustBand::from_score(40.0), TrustBand::Risky);
        assert_eq!(TrustBand::from_score(39.9), TrustBand::Avoid);
    }

    #[test]
    fn test_trust_band_serializes_uppercase() {
        let json = serde_json::to_string(&TrustBand::Strong).unwrap();
        assert_eq!(json, "\"STRONG\"");
    }

    #[test]
    fn test_social_snapshot_deserialize_defaults() {
        let json = r#"{"symbol":"TCS.NS","asOfDate":"2026-02-20","bullishPct":60,
            "bearishPct":40,"hypeVelocity":1.5,"confidence":70}"#;
        let snapshot: SocialSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.bullish_pct, 60.0);
        assert!(!snapshot.stale_data);
        assert!(!snapshot.meme_risk_flag);
    }
}
