//! Request DTOs for the gateway API
//!
//! Defines the structure of incoming HTTP request bodies and their range
//! checks. Each `validate` returns an error message, or `None` when valid.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::coerce;
use super::plans::RiskPersona;

/// Minimum number of quiz answers needed to score a profile.
pub const MIN_QUIZ_ANSWERS: usize = 6;

/// Validates a ticker path segment and returns it trimmed.
///
/// Symbols are 2 to 20 UTF-16 code units after trimming, the unit browser
/// clients count in.
pub fn validate_symbol(raw: &str) -> Result<&str, String> {
    let symbol = raw.trim();
    let len = symbol.encode_utf16().count();
    if len < 2 {
        return Err("Symbol must be at least 2 characters".to_string());
    }
    if len > 20 {
        return Err("Symbol must be at most 20 characters".to_string());
    }
    Ok(symbol)
}

/// Quiz question group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizSection {
    Emotional,
    Financial,
    Behavioral,
}

/// A single scored quiz answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub section: QuizSection,
    /// Answer weight, 0-100
    #[serde(deserialize_with = "coerce::number")]
    pub value: f64,
}

/// Request body for POST /api/quiz/submit
#[derive(Debug, Clone, Deserialize)]
pub struct QuizSubmitRequest {
    pub answers: Vec<QuizAnswer>,
}

impl QuizSubmitRequest {
    pub fn validate(&self) -> Option<String> {
        if self.answers.len() < MIN_QUIZ_ANSWERS {
            return Some(format!(
                "At least {} answers are required",
                MIN_QUIZ_ANSWERS
            ));
        }
        if let Some(index) = self
            .answers
            .iter()
            .position(|a| !(0.0..=100.0).contains(&a.value))
        {
            return Some(format!("Answer {} must be between 0 and 100", index));
        }
        None
    }
}

/// Request body for POST /api/portfolio/generate
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioRequest {
    pub risk_persona: RiskPersona,
    /// Lump sum in INR
    #[serde(deserialize_with = "coerce::number")]
    pub amount: f64,
    #[serde(deserialize_with = "coerce::whole_number")]
    pub horizon_months: u32,
}

impl PortfolioRequest {
    pub fn validate(&self) -> Option<String> {
        if !(1_000.0..=10_000_000.0).contains(&self.amount) {
            return Some("amount must be between 1000 and 10000000".to_string());
        }
        validate_horizon(self.horizon_months)
    }
}

/// Request body for POST /api/sip/generate
#[derive(Debug, Clone, Deserialize)]
pub struct SipRequest {
    /// Monthly contribution in INR
    #[serde(deserialize_with = "coerce::number")]
    pub monthly_budget: f64,
    pub risk_persona: RiskPersona,
    #[serde(deserialize_with = "coerce::whole_number")]
    pub horizon_months: u32,
}

impl SipRequest {
    pub fn validate(&self) -> Option<String> {
        if !(500.0..=500_000.0).contains(&self.monthly_budget) {
            return Some("monthly_budget must be between 500 and 500000".to_string());
        }
        validate_horizon(self.horizon_months)
    }
}

fn validate_horizon(months: u32) -> Option<String> {
    if !(6..=480).contains(&months) {
        return Some("horizon_months must be between 6 and 480".to_string());
    }
    None
}

/// Payment provider webhook body, parsed after its signature is checked.
#[derive(Debug, Clone, Deserialize)]
pub struct DonationWebhook {
    pub event: String,
    pub payload: Map<String, Value>,
}

impl DonationWebhook {
    /// Payment entity id at `payload.payment.entity.id`, if present.
    pub fn payment_id(&self) -> Option<&str> {
        self.payload
            .get("payment")?
            .get("entity")?
            .get("id")?
            .as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(n: usize, value: f64) -> Vec<QuizAnswer> {
        (0..n)
            .map(|_| QuizAnswer {
                section: QuizSection::Financial,
                value,
            })
            .collect()
    }

    #[test]
    fn test_validate_symbol_trims() {
        assert_eq!(validate_symbol("  TCS.NS "), Ok("TCS.NS"));
    }

    #[test]
    fn test_validate_symbol_bounds() {
        assert!(validate_symbol("A").is_err());
        assert!(validate_symbol("   ").is_err());
        assert!(validate_symbol(&"X".repeat(21)).is_err());
        assert!(validate_symbol(&"X".repeat(20)).is_ok());
    }

    #[test]
    fn test_validate_symbol_counts_utf16_units() {
        // Each emoji is one char but two UTF-16 units.
        assert!(validate_symbol("\u{1F680}").is_ok());
        assert!(validate_symbol(&"\u{1F680}".repeat(10)).is_ok());
        assert!(validate_symbol(&"\u{1F680}".repeat(11)).is_err());
    }

    #[test]
    fn test_quiz_request_deserialize() {
        let json = r#"{"answers":[{"section":"emotional","value":40}]}"#;
        let req: QuizSubmitRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.answers[0].section, QuizSection::Emotional);
    }

    #[test]
    fn test_quiz_value_as_string() {
        let json = r#"{"answers":[{"section":"behavioral","value":"40"}]}"#;
        let req: QuizSubmitRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.answers[0].value, 40.0);
    }

    #[test]
    fn test_quiz_requires_six_answers() {
        let req = QuizSubmitRequest { answers: answers(5, 50.0) };
        assert!(req.validate().is_some());

        let req = QuizSubmitRequest { answers: answers(6, 50.0) };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_quiz_value_out_of_range() {
        let req = QuizSubmitRequest { answers: answers(6, 101.0) };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_portfolio_validate() {
        let mut req = PortfolioRequest {
            risk_persona: RiskPersona::Owl,
            amount: 50_000.0,
            horizon_months: 36,
        };
        assert!(req.validate().is_none());

        req.amount = 999.0;
        assert!(req.validate().is_some());

        req.amount = 50_000.0;
        req.horizon_months = 5;
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_portfolio_accepts_form_strings() {
        let json = r#"{"risk_persona":"OWL","amount":"50000","horizon_months":"36"}"#;
        let req: PortfolioRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.amount, 50_000.0);
        assert_eq!(req.horizon_months, 36);
        assert!(req.validate().is_none());

        let json = r#"{"risk_persona":"OWL","amount":50000,"horizon_months":36.0}"#;
        let req: PortfolioRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.horizon_months, 36);
    }

    #[test]
    fn test_portfolio_rejects_fractional_horizon() {
        let json = r#"{"risk_persona":"OWL","amount":50000,"horizon_months":36.5}"#;
        assert!(serde_json::from_str::<PortfolioRequest>(json).is_err());
    }

    #[test]
    fn test_sip_accepts_form_strings() {
        let json = r#"{"monthly_budget":" 3000 ","risk_persona":"TURTLE","horizon_months":"120"}"#;
        let req: SipRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.monthly_budget, 3_000.0);
        assert_eq!(req.horizon_months, 120);
    }

    #[test]
    fn test_sip_validate() {
        let req = SipRequest {
            monthly_budget: 499.0,
            risk_persona: RiskPersona::Turtle,
            horizon_months: 12,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_webhook_payment_id() {
        let json = r#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_123"}}}}"#;
        let hook: DonationWebhook = serde_json::from_str(json).unwrap();
        assert_eq!(hook.payment_id(), Some("pay_123"));
    }

    #[test]
    fn test_webhook_requires_object_payload() {
        let json = r#"{"event":"payment.captured","payload":[1,2]}"#;
        assert!(serde_json::from_str::<DonationWebhook>(json).is_err());
    }
}
