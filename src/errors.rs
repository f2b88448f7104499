//! Error taxonomy for the Adobe Sign integration
//!
//! Three kinds cover every failure the service surfaces: `Auth` for
//! credential and signature problems, `Validation` for malformed input, and
//! `Client` for remote-API contract violations. Each remote-call failure is
//! wrapped at the point of detection with the underlying cause preserved for
//! diagnostics; there are no automatic retries anywhere.

use actix_web::HttpResponse;
use thiserror::Error;

use crate::utils::responses::ResponseBuilder;

type Cause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum SignError {
    /// Missing or invalid credentials: webhook client-id or signature
    /// mismatches, token refresh failures inside the token cache. Maps to
    /// 401 at the webhook boundary; the send pipeline rewraps token trouble
    /// as `Client` before it reaches a response.
    #[error("{message}")]
    Auth {
        message: String,
        #[source]
        source: Option<Cause>,
    },

    /// Malformed request or webhook body. Maps to 400.
    #[error("{message}")]
    Validation { message: String },

    /// Remote-API contract violation: transport failure, missing expected
    /// response fields, unresolved document, empty recipient list. Maps to
    /// 502 for agreement-sending flows.
    #[error("{message}")]
    Client {
        message: String,
        #[source]
        source: Option<Cause>,
    },
}

impl SignError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    pub fn auth_caused(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::Auth {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
            source: None,
        }
    }

    pub fn client_caused(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::Client {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// Stable machine-readable code used in error response bodies
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "unauthorized",
            Self::Validation { .. } => "invalid_request",
            Self::Client { .. } => "bad_gateway",
        }
    }

    /// Map this error to the HTTP response the API caller sees.
    ///
    /// Only the human-readable message is exposed; the source chain stays in
    /// the logs.
    #[must_use]
    pub fn to_response(&self) -> HttpResponse {
        let builder = match self {
            Self::Auth { .. } => ResponseBuilder::unauthorized(),
            Self::Validation { .. } => ResponseBuilder::bad_request(),
            Self::Client { .. } => ResponseBuilder::bad_gateway(),
        };
        builder
            .with_error_code(self.error_code())
            .with_message(&self.to_string())
            .build()
    }
}
