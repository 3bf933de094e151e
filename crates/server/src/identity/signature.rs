//! Webhook signature verification.
//!
//! The identity provider signs every event notification with HMAC-SHA256
//! over `"{message_id}.{timestamp}.{body}"` using a shared secret delivered
//! as `whsec_` + base64 key. The signature header carries one or more
//! space-separated `v1,<base64>` candidates (the provider rotates keys by
//! sending several). Verification is constant-time and rejects stale
//! timestamps to guard against replay.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the provider-issued webhook secret.
const SECRET_PREFIX: &str = "whsec_";

/// Accepted clock skew between the provider and us, in seconds.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Errors that can occur when verifying a webhook signature.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The configured secret is not `whsec_` + valid base64.
    #[error("webhook secret is malformed")]
    InvalidSecret,

    /// The timestamp header is not a unix timestamp.
    #[error("invalid timestamp header")]
    InvalidTimestamp,

    /// The timestamp is too far from the current time.
    #[error("timestamp outside tolerance window")]
    TimestampOutOfTolerance,

    /// No candidate in the signature header matched.
    #[error("signature mismatch")]
    Mismatch,
}

/// Verifier for provider event notifications.
pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    /// Build a verifier from the configured `whsec_` secret.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` if the secret is missing the
    /// prefix or the remainder is not valid base64.
    pub fn new(secret: &SecretString) -> Result<Self, SignatureError> {
        let encoded = secret
            .expose_secret()
            .strip_prefix(SECRET_PREFIX)
            .ok_or(SignatureError::InvalidSecret)?;

        let key = BASE64
            .decode(encoded)
            .map_err(|_| SignatureError::InvalidSecret)?;

        Ok(Self { key })
    }

    /// Verify an event against its three transport headers.
    ///
    /// `payload` must be the raw request body bytes, before any JSON
    /// parsing - re-serializing the parsed value would not round-trip.
    ///
    /// # Errors
    ///
    /// Returns the corresponding `SignatureError` if the timestamp is
    /// malformed or stale, or if no signature candidate matches.
    pub fn verify(
        &self,
        message_id: &str,
        timestamp: &str,
        signature_header: &str,
        payload: &[u8],
    ) -> Result<(), SignatureError> {
        self.verify_at(message_id, timestamp, signature_header, payload, now_unix())
    }

    /// [`Self::verify`] with an explicit "now", for testability.
    fn verify_at(
        &self,
        message_id: &str,
        timestamp: &str,
        signature_header: &str,
        payload: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;

        if (now - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
            return Err(SignatureError::TimestampOutOfTolerance);
        }

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(message_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        // The header may carry several candidates; any v1 match passes.
        for candidate in signature_header.split(' ') {
            let Some(encoded) = candidate.strip_prefix("v1,") else {
                continue;
            };
            let Ok(expected) = BASE64.decode(encoded) else {
                continue;
            };
            // verify_slice is constant-time
            if mac.clone().verify_slice(&expected).is_ok() {
                return Ok(());
            }
        }

        Err(SignatureError::Mismatch)
    }
}

fn now_unix() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
