//! Inbound webhook authentication.
//!
//! The payload is verified against its `sha256=<hex>` signature header before
//! any decoding happens. Unverified bytes never reach the JSON parser.

use crate::crypto::verify::verify_signature;
use crate::protocol::models::WebhookEvent;
use crate::LicenseChainError;
use serde_json::{Map, Value};

/// A received webhook: raw body plus its signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEnvelope {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Value of the signature header.
    pub signature_header: String,
}

impl WebhookEnvelope {
    /// Wrap a received body and header.
    pub fn new(payload: impl Into<Vec<u8>>, signature_header: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            signature_header: signature_header.into(),
        }
    }

    /// Whether the signature matches the payload under `secret`.
    pub fn verify(&self, secret: &str) -> bool {
        verify(&self.payload, &self.signature_header, secret)
    }

    /// Verified payload as a JSON object, or `None`.
    pub fn parse(&self, secret: &str) -> Option<Map<String, Value>> {
        parse(&self.payload, &self.signature_header, secret)
    }

    /// Verify and decode into a typed event.
    ///
    /// # Errors
    /// - `SignatureMismatch` - the signature does not match (payload not decoded)
    /// - `Protocol` - the verified payload is not a webhook event
    pub fn open(&self, secret: &str) -> Result<WebhookEvent, LicenseChainError> {
        if !self.verify(secret) {
            return Err(LicenseChainError::SignatureMismatch);
        }
        serde_json::from_slice(&self.payload).map_err(|e| {
            LicenseChainError::protocol(format!("Failed to parse webhook event: {}", e))
        })
    }
}

/// Check a webhook signature header in constant time.
pub fn verify(payload: &[u8], signature_header: &str, secret: &str) -> bool {
    let valid = verify_signature(secret, payload, signature_header);
    if !valid {
        tracing::warn!(payload_len = payload.len(), "webhook signature mismatch");
    }
    valid
}

/// Verify, then decode the payload as a JSON object.
///
/// Returns `None` when verification fails (without decoding) or when the
/// verified payload is not a JSON object.
pub fn parse(payload: &[u8], signature_header: &str, secret: &str) -> Option<Map<String, Value>> {
    if !verify(payload, signature_header, secret) {
        return None;
    }

    match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "verified webhook payload is not valid JSON");
            None
        }
    }
}
