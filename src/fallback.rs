//! Deterministic fallback data
//!
//! When the intelligence service is down and nothing is cached, the gateway
//! still answers with a stable per-symbol estimate flagged as stale and
//! low-confidence. The same symbol always yields the same numbers.

use chrono::{NaiveDate, Utc};

use crate::compliance::mandatory_disclaimers;
use crate::models::{SocialSnapshot, TrustBand, TrustComponents, TrustScore};

const TRUST_FALLBACK_CONFIDENCE: f64 = 35.0;
const SOCIAL_FALLBACK_CONFIDENCE: f64 = 30.0;

// == Stable Hash ==
/// Maps `"{symbol}:{salt}"` to a value in 0..100.
///
/// 32-bit wrapping `hash * 31 + unit` over the UTF-16 code units.
pub fn stable_value(symbol: &str, salt: &str) -> u32 {
    let source = format!("{}:{}", symbol, salt);
    let hash = source.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    (hash % 100).unsigned_abs()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn scaled(symbol: &str, salt: &str, base: f64, factor: f64) -> f64 {
    round2(base + f64::from(stable_value(symbol, salt)) * factor)
}

// == Trust Score ==
/// Placeholder trust score for `symbol`, dated today.
pub fn trust_fallback(symbol: &str) -> TrustScore {
    trust_fallback_on(symbol, Utc::now().date_naive())
}

/// Placeholder trust score for `symbol` as of `date`.
pub fn trust_fallback_on(symbol: &str, date: NaiveDate) -> TrustScore {
    let score = scaled(symbol, "trust", 40.0, 0.35);

    TrustScore {
        symbol: symbol.to_string(),
        as_of_date: date.format("%Y-%m-%d").to_string(),
        trust_score: score,
        trust_band: TrustBand::from_score(score),
        confidence: TRUST_FALLBACK_CONFIDENCE,
        limited_data: true,
        stale_data: true,
        components: TrustComponents {
            historical: scaled(symbol, "hist", 45.0, 0.2),
            financial: scaled(symbol, "fin", 48.0, 0.2),
            news: scaled(symbol, "news", 50.0, 0.1),
            market: scaled(symbol, "market", 46.0, 0.2),
            hype_penalty: 0.0,
        },
        explanations: vec![
            "Primary intelligence service is temporarily unavailable.".to_string(),
            "Fallback deterministic estimate is shown for continuity.".to_string(),
            "Limited historical data - confidence reduced.".to_string(),
        ],
        disclaimers: mandatory_disclaimers(),
    }
}

// == Social Snapshot ==
/// Placeholder social snapshot for `symbol`, dated today.
pub fn social_fallback(symbol: &str) -> SocialSnapshot {
    social_fallback_on(symbol, Utc::now().date_naive())
}

/// Placeholder social snapshot for `symbol` as of `date`.
pub fn social_fallback_on(symbol: &str, date: NaiveDate) -> SocialSnapshot {
    let bullish = scaled(symbol, "bullish", 45.0, 0.2);

    SocialSnapshot {
        symbol: symbol.to_string(),
        as_of_date: date.format("%Y-%m-%d").to_string(),
        bullish_pct: bullish,
        bearish_pct: round2(100.0 - bullish),
        hype_velocity: scaled(symbol, "velocity", 0.0, 1.1),
        confidence: SOCIAL_FALLBACK_CONFIDENCE,
        meme_risk_flag: false,
        stale_data: true,
    }
}
