//! Plan DTOs
//!
//! Risk profiles, portfolio plans and SIP plans produced by the intelligence
//! service. The gateway passes them through and appends disclaimers.

use serde::{Deserialize, Serialize};

/// Investor persona produced by the risk quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskPersona {
    Turtle,
    Owl,
    Tiger,
    Falcon,
}

/// Output of quiz scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub risk_score: f64,
    pub persona: RiskPersona,
    pub risk_level: String,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub model_version: String,
    #[serde(default)]
    pub disclaimers: Vec<String>,
}

/// One holding in a suggested allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationItem {
    pub symbol: String,
    pub label: String,
    pub sector: String,
    pub weight_pct: f64,
    pub expected_volatility: f64,
    pub trust_score: f64,
}

/// Educational lump-sum portfolio suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPlan {
    pub risk_persona: RiskPersona,
    pub amount_inr: f64,
    pub horizon_months: u32,
    pub confidence: f64,
    pub risk_level: String,
    pub volatility_estimate: f64,
    #[serde(default = "always")]
    pub educational_only: bool,
    #[serde(default = "always")]
    pub non_binding: bool,
    pub allocations: Vec<AllocationItem>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub disclaimers: Vec<String>,
}

/// Monthly SIP suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipPlan {
    pub monthly_budget_inr: f64,
    pub risk_persona: RiskPersona,
    pub horizon_months: u32,
    pub expected_drawdown: f64,
    #[serde(default)]
    pub rebalance_triggers: Vec<String>,
    pub allocations: Vec<AllocationItem>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub disclaimers: Vec<String>,
}

fn always() -> bool {
    true
}
