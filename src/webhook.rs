//! Donation webhook signatures
//!
//! The payment provider signs each webhook body with HMAC-SHA256 over the raw
//! bytes and sends the hex digest in `x-razorpay-signature`.

use ring::hmac;
use subtle::ConstantTimeEq;

// == Constants ==
/// Header carrying the hex HMAC of the raw body.
pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

// == Verification ==
/// Checks `signature` against the HMAC-SHA256 of `raw_body` under `secret`.
///
/// The header must equal the lowercase hex digest exactly; uppercase or
/// padded values are rejected. Always false without a secret. The comparison
/// is constant-time.
pub fn verify_webhook_signature(raw_body: &[u8], signature: &str, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return false;
    };

    let expected = sign(raw_body, secret);
    bool::from(expected.as_bytes().ct_eq(signature.as_bytes()))
}

// == Signing ==
/// Hex HMAC-SHA256 of `raw_body`, as the provider would send it.
pub fn sign(raw_body: &[u8], secret: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hex::encode(hmac::sign(&key, raw_body).as_ref())
}
