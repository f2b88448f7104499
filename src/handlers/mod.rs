// HTTP request handlers for the Adobe Sign integration service
pub mod agreements;
pub mod webhooks;

use actix_web::HttpResponse;

use crate::models::HealthResponse;
use crate::utils::responses::ResponseBuilder;

// Re-export the main handler functions
pub use agreements::send_agreement;
pub use webhooks::{webhook_get, webhook_post};

/// Health check handler
pub async fn health() -> HttpResponse {
    ResponseBuilder::ok(&HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}
