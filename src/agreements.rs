//! Agreement-sending pipeline against the Adobe Sign REST v6 API
//!
//! One flow: resolve recipients and document, upload the file as a transient
//! document, create the agreement, then fetch a signing URL. Every remote
//! call carries a bearer token fetched fresh from the token cache, so a
//! token may be refreshed mid-pipeline when its TTL lapses between steps.
//! A failed step aborts the whole pipeline; there are no retries. Temporary
//! document copies are cleaned up on every exit path by the drop guard in
//! `ResolvedDocument`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::documents::{resolve_document, ResolvedDocument};
use crate::errors::SignError;
use crate::models::{SendAgreementRequest, SendAgreementResponse};
use crate::oauth::TokenCache;
use crate::settings::AdobeSignSettings;

const MIME_TYPE_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const DEFAULT_MESSAGE: &str = "Please review and sign this sample agreement to verify the \
                               Acrobat Sign for Government integration.";
const SIGNATURE_TYPE_DIGITAL: &str = "DIGITAL_SIGNATURE";
const AGREEMENT_STATE_IN_PROCESS: &str = "IN_PROCESS";
const RECIPIENT_ROLE_SIGNER: &str = "SIGNER";

/// Orchestrates the four-step agreement-creation sequence
pub struct AgreementService {
    settings: AdobeSignSettings,
    token_cache: Arc<TokenCache>,
    http_client: reqwest::Client,
}

impl AgreementService {
    #[must_use]
    pub fn new(settings: AdobeSignSettings, token_cache: Arc<TokenCache>) -> Self {
        Self {
            settings,
            token_cache,
            http_client: reqwest::Client::new(),
        }
    }

    /// Upload a document and route it for signature.
    ///
    /// # Errors
    ///
    /// Fails with `SignError::Client` on any unrecoverable step: empty
    /// recipient list, unresolved document, transport failure, or a remote
    /// response missing its required identifier.
    pub async fn send_agreement(
        &self,
        request: &SendAgreementRequest,
    ) -> Result<SendAgreementResponse, SignError> {
        let recipients = self.resolve_recipients(request)?;
        let document = self.resolve_request_document(request)?;
        let agreement_name = non_blank(request.agreement_name.as_deref())
            .unwrap_or(&self.settings.default_agreement_name)
            .to_string();
        let message = non_blank(request.message.as_deref())
            .unwrap_or(DEFAULT_MESSAGE)
            .to_string();

        let transient_document_id = self.upload_document(&document).await?;
        let creation = self
            .create_agreement(&AgreementCreationRequest::build(
                &transient_document_id,
                &agreement_name,
                &message,
                &recipients,
            ))
            .await?;
        let signing_url = self.fetch_signing_url(&creation.id).await?;

        log::info!(
            "Created Adobe Sign agreement {} for {} recipient(s)",
            creation.id,
            recipients.len()
        );
        Ok(SendAgreementResponse {
            agreement_id: creation.id,
            expires_at: creation.expiration,
            sender_view_url: creation.url,
            signing_url,
        })
        // `document` drops here; a materialized temp copy is deleted whether
        // or not any step above bailed out early.
    }

    /// Recipient precedence: explicit list, then single e-mail field, then
    /// configured defaults.
    fn resolve_recipients(&self, request: &SendAgreementRequest) -> Result<Vec<String>, SignError> {
        let mut recipients: Vec<String> = request
            .recipient_emails
            .iter()
            .flatten()
            .filter(|email| !email.trim().is_empty())
            .cloned()
            .collect();
        if recipients.is_empty() {
            if let Some(email) = non_blank(request.recipient_email.as_deref()) {
                recipients.push(email.to_string());
            }
        }
        if recipients.is_empty() {
            recipients.extend(self.settings.default_recipient_emails.iter().cloned());
        }
        if recipients.is_empty() {
            return Err(SignError::client(
                "At least one recipient email address is required to send the test document.",
            ));
        }
        Ok(recipients)
    }

    fn resolve_request_document(
        &self,
        request: &SendAgreementRequest,
    ) -> Result<ResolvedDocument, SignError> {
        let location = non_blank(request.document_path.as_deref())
            .unwrap_or(&self.settings.test_document_path);
        resolve_document(location)
    }

    async fn upload_document(&self, document: &ResolvedDocument) -> Result<String, SignError> {
        let bytes = tokio::fs::read(document.path())
            .await
            .map_err(|e| SignError::client_caused("Failed to read the document to upload", e))?;
        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(document.filename().to_string())
            .mime_str(MIME_TYPE_DOCX)
            .map_err(|e| SignError::client_caused("Failed to build the document upload part", e))?;
        let form = reqwest::multipart::Form::new()
            .text("File-Name", document.filename().to_string())
            .text("Mime-Type", MIME_TYPE_DOCX)
            .part("File", file_part);

        let token = self.bearer_token().await?;
        let response = self
            .http_client
            .post(self.api_url("/transientDocuments"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SignError::client_caused("Unable to upload document to Adobe Sign", e))?;
        let response = check_status(response, "Unable to upload document to Adobe Sign").await?;

        let payload: TransientDocumentResponse = response
            .json()
            .await
            .map_err(|e| SignError::client_caused("Unable to upload document to Adobe Sign", e))?;
        payload
            .transient_document_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SignError::client("Adobe Sign did not return a transientDocumentId."))
    }

    async fn create_agreement(
        &self,
        payload: &AgreementCreationRequest,
    ) -> Result<AgreementCreationResponse, SignError> {
        let token = self.bearer_token().await?;
        let response = self
            .http_client
            .post(self.api_url("/agreements"))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                SignError::client_caused("Unable to create agreement via Adobe Sign REST API", e)
            })?;
        let response =
            check_status(response, "Unable to create agreement via Adobe Sign REST API").await?;

        let creation: AgreementCreationResponse = response.json().await.map_err(|e| {
            SignError::client_caused("Unable to create agreement via Adobe Sign REST API", e)
        })?;
        if creation.id.trim().is_empty() {
            return Err(SignError::client("Adobe Sign did not return an agreement id."));
        }
        Ok(creation)
    }

    async fn fetch_signing_url(&self, agreement_id: &str) -> Result<Option<String>, SignError> {
        let token = self.bearer_token().await?;
        let response = self
            .http_client
            .get(self.api_url(&format!("/agreements/{agreement_id}/signingUrls")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                SignError::client_caused("Unable to retrieve signing URL from Adobe Sign", e)
            })?;
        let response =
            check_status(response, "Unable to retrieve signing URL from Adobe Sign").await?;

        let payload: SigningUrlResponse = response.json().await.map_err(|e| {
            SignError::client_caused("Unable to retrieve signing URL from Adobe Sign", e)
        })?;
        Ok(payload.first_signing_url())
    }

    /// Token trouble inside the pipeline is a remote-contract failure from
    /// the API caller's point of view, not an authentication failure on our
    /// own boundary.
    async fn bearer_token(&self) -> Result<String, SignError> {
        self.token_cache.access_token().await.map_err(|e| {
            SignError::client_caused("Unable to obtain an Adobe Sign access token", e)
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.settings.base_uri.trim_end_matches('/'))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

async fn check_status(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, SignError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::warn!("{context}: Adobe Sign returned {status}: {body}");
    Err(SignError::client(format!("{context} (status {status})")))
}

// Wire payloads for the Adobe Sign REST v6 contract. Unknown response
// fields are ignored for forward compatibility.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgreementCreationRequest {
    file_infos: Vec<FileInfo>,
    name: String,
    participant_sets_info: Vec<ParticipantSetInfo>,
    signature_type: String,
    external_id: ExternalId,
    message: String,
    state: String,
}

impl AgreementCreationRequest {
    fn build(
        transient_document_id: &str,
        agreement_name: &str,
        message: &str,
        recipients: &[String],
    ) -> Self {
        let participant_sets_info = recipients
            .iter()
            .enumerate()
            .map(|(index, email)| ParticipantSetInfo {
                role: RECIPIENT_ROLE_SIGNER.to_string(),
                order: index as u32 + 1,
                private_message: message.to_string(),
                member_infos: vec![MemberInfo {
                    email: email.clone(),
                }],
            })
            .collect();

        Self {
            file_infos: vec![FileInfo {
                transient_document_id: transient_document_id.to_string(),
            }],
            name: agreement_name.to_string(),
            participant_sets_info,
            signature_type: SIGNATURE_TYPE_DIGITAL.to_string(),
            external_id: ExternalId {
                id: format!("integration-{}", Utc::now().timestamp_millis()),
            },
            message: message.to_string(),
            state: AGREEMENT_STATE_IN_PROCESS.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileInfo {
    transient_document_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantSetInfo {
    role: String,
    order: u32,
    private_message: String,
    member_infos: Vec<MemberInfo>,
}

#[derive(Debug, Serialize)]
struct MemberInfo {
    email: String,
}

#[derive(Debug, Serialize)]
struct ExternalId {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransientDocumentResponse {
    transient_document_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgreementCreationResponse {
    #[serde(default)]
    id: String,
    expiration: Option<DateTime<Utc>>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SigningUrlResponse {
    #[serde(default)]
    signing_url_set_infos: Vec<SigningUrlSetInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SigningUrlSetInfo {
    #[serde(default)]
    signing_urls: Vec<SigningUrl>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SigningUrl {
    esign_url: Option<String>,
}

impl SigningUrlResponse {
    /// Flatten all signing-URL sets and return the first non-empty URL.
    /// An empty result is not an error; the agreement may not be ready yet.
    fn first_signing_url(&self) -> Option<String> {
        self.signing_url_set_infos
            .iter()
            .flat_map(|set| &set.signing_urls)
            .filter_map(|entry| entry.esign_url.as_deref())
            .find(|url| !url.trim().is_empty())
            .map(ToString::to_string)
    }
}
