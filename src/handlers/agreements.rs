// Agreement-sending handler
use actix_web::{web, HttpResponse};
use log::{error, info};

use crate::agreements::AgreementService;
use crate::models::SendAgreementRequest;
use crate::utils::responses::ResponseBuilder;

/// Handle `POST /api/agreements/send`
///
/// Returns 202 with the created agreement record, 400 when a supplied
/// recipient e-mail is malformed, and 502 when any remote step fails.
pub async fn send_agreement(
    request: web::Json<SendAgreementRequest>,
    service: web::Data<AgreementService>,
) -> HttpResponse {
    if let Some(email) = request.first_invalid_email() {
        return ResponseBuilder::bad_request()
            .with_error_code("invalid_recipient")
            .with_message(&format!("'{email}' is not a valid e-mail address"))
            .build();
    }

    match service.send_agreement(&request).await {
        Ok(response) => {
            info!("Agreement {} accepted for sending", response.agreement_id);
            ResponseBuilder::accepted(&response)
        }
        Err(err) => {
            error!("Failed to send agreement: {err}");
            err.to_response()
        }
    }
}
