//! Boundary data types: API request/response bodies and the webhook payload
//!
//! Remote Adobe Sign wire payloads live next to the code that sends them
//! (`oauth`, `agreements`); this module only holds the shapes crossing our
//! own HTTP boundary. Webhook parsing is forward-compatible: unknown fields
//! are ignored and every section is optional.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of `POST /api/agreements/send`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAgreementRequest {
    pub recipient_email: Option<String>,
    pub recipient_emails: Option<Vec<String>>,
    pub agreement_name: Option<String>,
    pub message: Option<String>,
    pub document_path: Option<String>,
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
});

impl SendAgreementRequest {
    /// Check the shape of any supplied recipient e-mail addresses.
    ///
    /// Returns the first offending address, if any. Blank entries are not
    /// flagged here; recipient resolution filters them out.
    #[must_use]
    pub fn first_invalid_email(&self) -> Option<&str> {
        let single = self
            .recipient_email
            .as_deref()
            .filter(|e| !e.trim().is_empty());
        let listed = self
            .recipient_emails
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|e| !e.trim().is_empty());
        single
            .into_iter()
            .chain(listed)
            .find(|email| !EMAIL_RE.is_match(email))
    }
}

/// Body of the 202 response from `POST /api/agreements/send`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAgreementResponse {
    pub agreement_id: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub sender_view_url: Option<String>,
    pub signing_url: Option<String>,
}

/// Parsed Adobe Sign webhook notification body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub event: Option<EventMetadata>,
    pub agreement: Option<AgreementInfo>,
    pub participant_info: Option<ParticipantInfo>,
    #[serde(default)]
    pub documents_info: Vec<DocumentInfo>,
    pub webhook: Option<WebhookInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub event_id: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub event_resource_type: Option<String>,
    pub event_resource_id: Option<String>,
    pub webhook_id: Option<String>,
    pub webhook_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
    pub expiration_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub email: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookInfo {
    pub webhook_id: Option<String>,
    pub webhook_name: Option<String>,
    pub webhook_notification_id: Option<String>,
}

impl WebhookPayload {
    /// Agreement events are the only notifications forwarded to business
    /// logic; everything else is accepted and ignored.
    #[must_use]
    pub fn is_agreement_event(&self) -> bool {
        self.event_type()
            .is_some_and(|event_type| event_type.starts_with("AGREEMENT_"))
    }

    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.event
            .as_ref()
            .and_then(|event| event.event_type.as_deref())
            .filter(|event_type| !event_type.trim().is_empty())
    }
}
