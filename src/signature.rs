//! GitHub webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs each delivery with the shared webhook secret and sends the
//! result in `X-Hub-Signature-256` as `sha256=<hex>`. Verification must run
//! over the raw request bytes, before the body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Parses a signature header (`sha256=abc123...`) into raw bytes.
///
/// Returns `None` for a missing prefix, another algorithm or invalid hex.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// HMAC-SHA256 of `payload` keyed with `secret`.
#[cfg(test)]
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, so keying cannot fail here.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as a GitHub-style header value: `sha256=<hex>`.
#[cfg(test)]
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verifies a webhook signature against the raw payload and secret.
///
/// Comparison is constant time (`Mac::verify_slice`). Malformed headers
/// return `false`.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let expected_signature = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    mac.verify_slice(&expected_signature).is_ok()
}

/// How inbound deliveries are authenticated.
#[derive(Clone)]
pub enum SignaturePolicy {
    /// Require a valid `X-Hub-Signature-256` for this secret.
    Enforce(Vec<u8>),
    /// Accept every delivery. Local development only.
    Bypass,
}

impl SignaturePolicy {
    /// Whether a delivery with this body and signature header may be processed.
    pub fn check(&self, payload: &[u8], signature_header: Option<&str>) -> bool {
        match self {
            SignaturePolicy::Enforce(secret) => match signature_header {
                Some(header) => verify_signature(payload, header, secret),
                None => false,
            },
            SignaturePolicy::Bypass => {
                warn!("webhook signature check bypassed: no secret configured");
                true
            }
        }
    }
}

impl std::fmt::Debug for SignaturePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignaturePolicy::Enforce(_) => write!(f, "Enforce(<redacted>)"),
            SignaturePolicy::Bypass => write!(f, "Bypass"),
        }
    }
}
