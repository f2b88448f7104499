// Webhook ingestion handlers
use actix_web::{web, HttpRequest, HttpResponse};
use log::{info, warn};

use crate::models::WebhookPayload;
use crate::webhooks::{WebhookOutcome, WebhookVerifier, HEADER_CLIENT_ID, HEADER_SIGNATURE};

/// Handle `POST /api/webhooks/adobesign`
///
/// Returns 200 for every accepted outcome (handshake included); 401/400 when
/// verification or parsing fails.
pub async fn webhook_post(
    req: HttpRequest,
    body: web::Bytes,
    verifier: web::Data<WebhookVerifier>,
) -> HttpResponse {
    handle(&req, &body, &verifier)
}

/// Handle `GET /api/webhooks/adobesign` — the bodyless handshake variant
pub async fn webhook_get(req: HttpRequest, verifier: web::Data<WebhookVerifier>) -> HttpResponse {
    handle(&req, b"", &verifier)
}

fn handle(req: &HttpRequest, body: &[u8], verifier: &WebhookVerifier) -> HttpResponse {
    let client_id = header_value(req, HEADER_CLIENT_ID);
    let signature = header_value(req, HEADER_SIGNATURE);

    match verifier.handle(client_id, signature, body) {
        Ok(WebhookOutcome::AgreementEvent(payload)) => {
            log_agreement_event(&payload);
            HttpResponse::Ok().finish()
        }
        Ok(WebhookOutcome::Handshake | WebhookOutcome::Ignored { .. }) => {
            HttpResponse::Ok().finish()
        }
        Err(err) => {
            warn!("Rejected Adobe Sign webhook: {err}");
            err.to_response()
        }
    }
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|value| value.to_str().ok())
}

/// The observation step for authentic agreement events
fn log_agreement_event(payload: &WebhookPayload) {
    let agreement = payload.agreement.as_ref();
    info!(
        "Adobe Sign event {} for agreement {} (name: {}, status: {}, participant: {})",
        payload.event_type().unwrap_or("UNKNOWN"),
        agreement.and_then(|a| a.id.as_deref()).unwrap_or("UNKNOWN"),
        agreement.and_then(|a| a.name.as_deref()).unwrap_or("n/a"),
        agreement.and_then(|a| a.status.as_deref()).unwrap_or("n/a"),
        payload
            .participant_info
            .as_ref()
            .and_then(|p| p.email.as_deref())
            .unwrap_or("n/a"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    use crate::settings::AdobeSignSettings;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::from_settings(&AdobeSignSettings {
            client_id: "integration-client".to_string(),
            ..AdobeSignSettings::default()
        })
    }

    #[actix_web::test]
    async fn handshake_get_returns_200() {
        let req = TestRequest::get()
            .insert_header((HEADER_CLIENT_ID, "integration-client"))
            .to_http_request();
        let response = handle(&req, b"", &verifier());
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn missing_client_id_returns_401() {
        let req = TestRequest::post().to_http_request();
        let response = handle(&req, b"{}", &verifier());
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn malformed_body_returns_400() {
        let req = TestRequest::post()
            .insert_header((HEADER_CLIENT_ID, "integration-client"))
            .to_http_request();
        let response = handle(&req, b"{oops", &verifier());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().try_into_bytes().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"], "invalid_request");
    }

    #[actix_web::test]
    async fn agreement_event_returns_200() {
        let req = TestRequest::post()
            .insert_header((HEADER_CLIENT_ID, "integration-client"))
            .to_http_request();
        let body = br#"{"event": {"eventType": "AGREEMENT_ACTION_COMPLETED"}}"#;
        let response = handle(&req, body, &verifier());
        assert_eq!(response.status(), StatusCode::OK);
    }
}
