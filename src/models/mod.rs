//! Request and Response models for the gateway
//!
//! This module defines the DTOs used for serializing/deserializing HTTP
//! bodies, both on the public API and towards the intelligence service.

mod coerce;
pub mod plans;
pub mod requests;
pub mod responses;
pub mod stocks;

// Re-export commonly used types
pub use plans::{AllocationItem, PortfolioPlan, RiskPersona, RiskProfile, SipPlan};
pub use requests::{
    validate_symbol, DonationWebhook, PortfolioRequest, QuizAnswer, QuizSection,
    QuizSubmitRequest, SipRequest,
};
pub use responses::{
    AckResponse, AnnotatedResponse, DataResponse, DependencyStatus, ErrorResponse, FeedResponse,
    HealthResponse,
};
pub use stocks::{is_news_feed_stale, NewsItem, SocialSnapshot, TrustBand, TrustComponents, TrustScore};
