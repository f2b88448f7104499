//! HTTP response construction helpers
//!
//! A unified builder for the handful of response shapes this service emits:
//! JSON success bodies (200/202) and structured error bodies for 400, 401
//! and 502. Error bodies always look like `{"error": code, "message": text}`.

use actix_web::{http::header, HttpResponse};
use serde_json::{json, Value};

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Create a `BadRequest` (400) error response with optional customization
    #[must_use]
    pub fn bad_request() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::BadRequest)
    }

    /// Create an `Unauthorized` (401) error response with optional customization
    #[must_use]
    pub fn unauthorized() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Unauthorized)
    }

    /// Create a `BadGateway` (502) error response with optional customization
    #[must_use]
    pub fn bad_gateway() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::BadGateway)
    }

    /// Create an OK response (200) with JSON content
    #[must_use]
    pub fn ok<T: serde::Serialize>(data: &T) -> HttpResponse {
        HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(data)
    }

    /// Create an Accepted response (202) with JSON content
    #[must_use]
    pub fn accepted<T: serde::Serialize>(data: &T) -> HttpResponse {
        HttpResponse::Accepted()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(data)
    }
}

/// Builder for error responses with fluent interface
pub struct ErrorResponseBuilder {
    error_type: ErrorType,
    error_code: Option<String>,
    message: Option<String>,
}

#[derive(Clone, Copy)]
enum ErrorType {
    BadRequest,
    Unauthorized,
    BadGateway,
}

impl ErrorResponseBuilder {
    fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            error_code: None,
            message: None,
        }
    }

    /// Set a custom error code (e.g. "`invalid_request`", "`unauthorized`")
    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    /// Set a custom error message
    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Build the final `HttpResponse`
    #[must_use]
    pub fn build(self) -> HttpResponse {
        let error_code = self
            .error_code
            .unwrap_or_else(|| self.error_type.default_code().to_string());
        let message = self
            .message
            .unwrap_or_else(|| self.error_type.default_message().to_string());

        let body: Value = json!({
            "error": error_code,
            "message": message,
        });

        let mut response = match self.error_type {
            ErrorType::BadRequest => HttpResponse::BadRequest(),
            ErrorType::Unauthorized => HttpResponse::Unauthorized(),
            ErrorType::BadGateway => HttpResponse::BadGateway(),
        };
        response
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(body)
    }
}

impl ErrorType {
    fn default_code(self) -> &'static str {
        match self {
            Self::BadRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::BadGateway => "bad_gateway",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Self::BadRequest => "The request is malformed or invalid",
            Self::Unauthorized => "Authentication is required to access this resource",
            Self::BadGateway => "Failed to reach the Adobe Sign service",
        }
    }
}
