//! Adobe Sign webhook verification
//!
//! Every inbound notification walks the same states: client-id check,
//! handshake short-circuit for empty bodies, HMAC signature check, then
//! parse-and-classify. Adobe Sign sends the signature either hex- or
//! base64-encoded, optionally with a `sha256=` prefix; decoding tries hex
//! first and falls back to base64. Comparison is constant-time.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::SignError;
use crate::models::WebhookPayload;
use crate::settings::AdobeSignSettings;

pub const HEADER_CLIENT_ID: &str = "X-AdobeSign-ClientId";
pub const HEADER_SIGNATURE: &str = "X-AdobeSign-Signature";

type HmacSha256 = Hmac<Sha256>;

/// Terminal outcome of an accepted notification
#[derive(Debug)]
pub enum WebhookOutcome {
    /// Empty-body verification ping; nothing to process
    Handshake,
    /// Authentic, but not an agreement event; accepted and dropped
    Ignored { event_type: Option<String> },
    /// Authentic agreement event, ready for the observation step
    AgreementEvent(Box<WebhookPayload>),
}

/// Validates inbound notification authenticity
pub struct WebhookVerifier {
    expected_client_id: String,
    signing_secret: Option<String>,
}

impl WebhookVerifier {
    #[must_use]
    pub fn from_settings(settings: &AdobeSignSettings) -> Self {
        Self {
            expected_client_id: settings.client_id.clone(),
            signing_secret: settings
                .webhook_signing_secret
                .clone()
                .filter(|secret| !secret.trim().is_empty()),
        }
    }

    /// Run the verification state machine over one notification.
    ///
    /// # Errors
    ///
    /// Fails with `SignError::Auth` for a missing or mismatched client id,
    /// a missing, undecodable, or mismatched signature; and with
    /// `SignError::Validation` for a body that is not well-formed JSON.
    pub fn handle(
        &self,
        client_id: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookOutcome, SignError> {
        self.validate_client_id(client_id)?;

        if body.is_empty() {
            log::info!(
                "Received Adobe Sign webhook handshake for integration {}",
                self.expected_client_id
            );
            return Ok(WebhookOutcome::Handshake);
        }

        self.validate_signature(signature, body)?;

        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|_| SignError::validation("Unable to parse Adobe Sign webhook payload"))?;

        if payload.is_agreement_event() {
            Ok(WebhookOutcome::AgreementEvent(Box::new(payload)))
        } else {
            let event_type = payload.event_type().map(ToString::to_string);
            log::debug!(
                "Ignoring Adobe Sign event {} because it is not an agreement event",
                event_type.as_deref().unwrap_or("UNKNOWN")
            );
            Ok(WebhookOutcome::Ignored { event_type })
        }
    }

    fn validate_client_id(&self, client_id: Option<&str>) -> Result<(), SignError> {
        let client_id = client_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SignError::auth(format!("{HEADER_CLIENT_ID} header is required")))?;
        if client_id != self.expected_client_id {
            return Err(SignError::auth("Invalid Adobe Sign client id"));
        }
        Ok(())
    }

    fn validate_signature(&self, signature: Option<&str>, body: &[u8]) -> Result<(), SignError> {
        let Some(secret) = self.signing_secret.as_deref() else {
            log::warn!(
                "Skipping Adobe Sign webhook signature validation because no signing secret is configured"
            );
            return Ok(());
        };

        let signature = signature
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| SignError::auth(format!("{HEADER_SIGNATURE} header is required")))?;
        let provided = decode_signature(signature)?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| SignError::auth(format!("Unable to initialize HMAC-SHA256: {e}")))?;
        mac.update(body);
        mac.verify_slice(&provided)
            .map_err(|_| SignError::auth("Adobe Sign webhook signature verification failed"))
    }
}

/// Decode the signature header: strip an optional case-insensitive
/// `sha256=` prefix and embedded whitespace, then try hex and fall back to
/// base64. Hex wins when both would decode.
fn decode_signature(header: &str) -> Result<Vec<u8>, SignError> {
    let mut sanitized = header.trim();
    if let Some(prefix) = sanitized.get(..7) {
        if prefix.eq_ignore_ascii_case("sha256=") {
            sanitized = &sanitized[7..];
        }
    }
    let sanitized: String = sanitized.chars().filter(|c| !c.is_whitespace()).collect();

    if let Ok(bytes) = hex::decode(&sanitized) {
        return Ok(bytes);
    }
    general_purpose::STANDARD
        .decode(&sanitized)
        .map_err(|_| SignError::auth("Invalid Adobe Sign webhook signature encoding"))
}
