//! Webhook payload signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw body using the
//! shared webhook secret, and sends the result in the
//! `X-Hub-Signature-256` header as `sha256=<hex>`. Verification must run
//! against the raw bytes before any JSON parsing, and a mismatch rejects
//! the delivery without persisting anything.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parse a `sha256=<hex>` signature header into raw bytes.
///
/// Returns `None` for a missing prefix, a different algorithm, or invalid
/// hex. Never panics.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Compute the HMAC-SHA256 signature of a payload with the given secret.
///
/// Used by tests and by tooling that needs to forge valid deliveries
/// against a local instance.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Format a raw signature as a `sha256=<hex>` header value.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verify a webhook signature header against the raw payload and secret.
///
/// The comparison is constant-time (delegated to `Mac::verify_slice`), so
/// the verifier does not leak how many signature bytes matched. Malformed
/// headers fail verification rather than erroring.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(claimed) = parse_signature_header(signature_header) else {
        return false;
    };
    // A SHA-256 MAC is exactly 32 bytes.
    if claimed.len() != 32 {
        return false;
    }

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&claimed).is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
