//! Webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 keyed by the webhook secret and
//! sends the digest in the `X-Hub-Signature-256` header as `sha256=<hex>`.
//! Verification must happen before the body is parsed.

use crate::secret::WebhookSecret;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Prefix GitHub puts in front of the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Length in bytes of an HMAC-SHA256 digest.
const DIGEST_LEN: usize = 32;

/// Verify a webhook signature header against the raw body.
///
/// Returns `false` when the header is missing, malformed, or does not match
/// the HMAC-SHA256 of `payload` under `secret`. The digest comparison runs in
/// constant time.
///
/// # Examples
///
/// ```rust
/// use webhook_receiver_core::{
///     compute_signature, format_signature_header, verify_signature, WebhookSecret,
/// };
///
/// let secret = WebhookSecret::new("my-secret-key");
/// let payload = b"Hello, World!";
/// let header = format_signature_header(&compute_signature(&secret, payload));
///
/// assert!(verify_signature(&secret, payload, Some(&header)));
/// assert!(!verify_signature(&WebhookSecret::new("wrong"), payload, Some(&header)));
/// assert!(!verify_signature(&secret, payload, None));
/// ```
pub fn verify_signature(secret: &WebhookSecret, payload: &[u8], header: Option<&str>) -> bool {
    let provided = match header.and_then(parse_signature_header) {
        Some(bytes) => bytes,
        None => return false,
    };

    // Length is not secret; checking it first keeps ct_eq on equal-size inputs
    if provided.len() != DIGEST_LEN {
        return false;
    }

    let expected = compute_signature(secret, payload);
    provided.ct_eq(&expected).into()
}

/// Parse a `sha256=<hex>` header into raw digest bytes.
///
/// Returns `None` for a missing prefix or invalid hex. Never panics.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_signature = header.trim().strip_prefix(SIGNATURE_PREFIX)?;
    hex::decode(hex_signature).ok()
}

/// Compute the HMAC-SHA256 digest of `payload` keyed by `secret`.
pub fn compute_signature(secret: &WebhookSecret, payload: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.expose_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Format a digest as a GitHub-style header value (`sha256=<hex>`).
pub fn format_signature_header(digest: &[u8]) -> String {
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(digest))
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
