//! Lenient numeric fields
//!
//! Web clients post form values as strings, so request bodies accept a JSON
//! number, a numeric string, a boolean or null wherever a number is expected.
//! Strings are trimmed; an empty string reads as zero. Anything that does not
//! produce a number is rejected, leaving range checks to `validate`.

use serde::de::{Deserializer, Error};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
    Flag(bool),
    Null,
}

// == Parsing ==
/// Reads `text` the way a form field is read as a number.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }

    let radix = match text.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&text[2..], radix).ok().map(|n| n as f64);
    }

    // Rust accepts "inf" and "nan" spellings that a form parser would not.
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits == "Infinity" {
        return Some(sign * f64::INFINITY);
    }
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    digits.parse::<f64>().ok().map(|n| sign * n)
}

// == Deserializers ==
/// `deserialize_with` target for a number field.
pub(crate) fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Loose::deserialize(deserializer)? {
        Loose::Number(n) => n,
        Loose::Flag(flag) => f64::from(u8::from(flag)),
        Loose::Null => 0.0,
        Loose::Text(text) => parse_number(&text)
            .ok_or_else(|| D::Error::custom(format!("expected a number, got \"{}\"", text)))?,
    };
    if value.is_nan() {
        return Err(D::Error::custom("expected a number"));
    }
    Ok(value)
}

/// `deserialize_with` target for a whole-number field; `36`, `36.0` and
/// `"36"` are all accepted, `36.5` is not.
pub(crate) fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = number(deserializer)?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(D::Error::custom(format!(
            "expected a non-negative whole number, got {}",
            value
        )));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(deserialize_with = "number")]
        amount: f64,
        #[serde(deserialize_with = "whole_number")]
        months: u32,
    }

    fn form(json: &str) -> Result<Form, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number(" 50000 "), Some(50_000.0));
        assert_eq!(parse_number("1e3"), Some(1_000.0));
        assert_eq!(parse_number("-2.5"), Some(-2.5));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("0x1F"), Some(31.0));
        assert_eq!(parse_number(""), Some(0.0));
        assert_eq!(parse_number("Infinity"), Some(f64::INFINITY));
    }

    #[test]
    fn test_parse_number_rejects_words() {
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("12abc"), None);
    }

    #[test]
    fn test_numbers_and_strings_accepted() {
        let f = form(r#"{"amount":"50000","months":"36"}"#).unwrap();
        assert_eq!(f.amount, 50_000.0);
        assert_eq!(f.months, 36);

        let f = form(r#"{"amount":50000.5,"months":36.0}"#).unwrap();
        assert_eq!(f.amount, 50_000.5);
        assert_eq!(f.months, 36);
    }

    #[test]
    fn test_flags_and_null() {
        let f = form(r#"{"amount":true,"months":null}"#).unwrap();
        assert_eq!(f.amount, 1.0);
        assert_eq!(f.months, 0);
    }

    #[test]
    fn test_fractional_whole_number_rejected() {
        assert!(form(r#"{"amount":1,"months":36.5}"#).is_err());
        assert!(form(r#"{"amount":1,"months":"-6"}"#).is_err());
    }

    #[test]
    fn test_non_numeric_rejected() {
        let err = form(r#"{"amount":"lots","months":12}"#).unwrap_err();
        assert!(err.to_string().contains("expected a number"));
        assert!(form(r#"{"amount":[1],"months":12}"#).is_err());
    }
}
