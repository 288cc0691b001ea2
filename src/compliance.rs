//! Compliance text helpers
//!
//! Every insight leaves the gateway with the mandatory disclaimers attached,
//! and upstream narrative text is scrubbed of advisory phrasing.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

// == Phrase Lists ==
/// Disclaimers attached to every insight response.
pub const MANDATORY_DISCLAIMERS: [&str; 4] = [
    "Educational purposes only.",
    "This is not financial advice.",
    "Market risks are involved in all investments.",
    "No guaranteed returns.",
];

/// Phrases that read as investment advice.
pub const FORBIDDEN_PHRASES: [&str; 5] = [
    "you should buy",
    "guaranteed profit",
    "this stock will go up",
    "best stock to buy now",
    "sure shot",
];

const REDACTION: &str = "[removed-for-compliance]";

// == Disclaimers ==
/// Returns an owned copy of the mandatory disclaimers.
pub fn mandatory_disclaimers() -> Vec<String> {
    MANDATORY_DISCLAIMERS.iter().map(|s| s.to_string()).collect()
}

// == Redaction ==
fn forbidden_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FORBIDDEN_PHRASES
            .iter()
            .filter_map(|phrase| {
                RegexBuilder::new(&regex::escape(phrase))
                    .case_insensitive(true)
                    .build()
                    .ok()
            })
            .collect()
    })
}

/// Replaces every forbidden phrase, in any casing, with a redaction marker.
pub fn sanitize_narrative(text: &str) -> String {
    forbidden_patterns()
        .iter()
        .fold(text.to_string(), |acc, pattern| {
            pattern.replace_all(&acc, REDACTION).into_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_forbidden_phrases() {
        let output = sanitize_narrative("You should buy this stock now for guaranteed profit.");
        let lower = output.to_lowercase();

        assert!(!lower.contains("you should buy"));
        assert!(!lower.contains("guaranteed profit"));
        assert_eq!(
            output,
            "[removed-for-compliance] this stock now for [removed-for-compliance]."
        );
    }

    #[test]
    fn test_clean_text_unchanged() {
        let text = "Historically this may indicate higher volatility.";
        assert_eq!(sanitize_narrative(text), text);
    }

    #[test]
    fn test_mandatory_disclaimers() {
        let disclaimers = mandatory_disclaimers();
        assert_eq!(disclaimers.len(), 4);
        assert_eq!(disclaimers[1], "This is not financial advice.");
    }
}
