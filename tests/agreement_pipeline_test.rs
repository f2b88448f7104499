// Integration tests for the agreement-sending pipeline against a mocked
// Adobe Sign REST API and token endpoint.
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use httpmock::prelude::*;
use serde_json::json;
use serial_test::serial;
use signbridge::agreements::AgreementService;
use signbridge::errors::SignError;
use signbridge::handlers::send_agreement;
use signbridge::models::SendAgreementRequest;
use signbridge::oauth::TokenCache;
use signbridge::settings::AdobeSignSettings;

fn settings_for(server: &MockServer) -> AdobeSignSettings {
    AdobeSignSettings {
        base_uri: server.base_url(),
        oauth_token_uri: server.url("/oauth/token"),
        client_id: "integration-client".to_string(),
        client_secret: "integration-secret".to_string(),
        refresh_token: "refresh-1".to_string(),
        default_recipient_emails: vec!["default@example.com".to_string()],
        ..AdobeSignSettings::default()
    }
}

fn service_for(server: &MockServer) -> AgreementService {
    let settings = settings_for(server);
    let token_cache = Arc::new(TokenCache::from_settings(&settings));
    AgreementService::new(settings, token_cache)
}

async fn mock_token_endpoint(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200).json_body(json!({
                "access_token": "access-token-1",
                "token_type": "Bearer",
                "expires_in": 3600
            }));
        })
        .await;
}

/// Temp files created by document materialization, by name
fn temp_artifacts() -> HashSet<PathBuf> {
    std::fs::read_dir(std::env::temp_dir())
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    path.file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| name.starts_with("signbridge-"))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
#[serial]
async fn full_pipeline_returns_the_agreement_record() {
    let server = MockServer::start_async().await;
    mock_token_endpoint(&server).await;

    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/transientDocuments")
                .header("authorization", "Bearer access-token-1");
            then.status(200)
                .json_body(json!({ "transientDocumentId": "doc-123" }));
        })
        .await;

    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/agreements")
                .header("authorization", "Bearer access-token-1")
                .json_body_partial(
                    r#"{
                        "fileInfos": [{"transientDocumentId": "doc-123"}],
                        "signatureType": "DIGITAL_SIGNATURE",
                        "state": "IN_PROCESS",
                        "participantSetsInfo": [
                            {"role": "SIGNER", "order": 1,
                             "memberInfos": [{"email": "signer@example.com"}]}
                        ]
                    }"#,
                );
            then.status(200).json_body(json!({
                "id": "agr-1",
                "expiration": "2026-09-22T12:00:00Z",
                "url": "https://sign.example.com/view/agr-1"
            }));
        })
        .await;

    let signing_urls = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/agreements/agr-1/signingUrls")
                .header("authorization", "Bearer access-token-1");
            then.status(200).json_body(json!({
                "signingUrlSetInfos": [
                    {"signingUrls": [
                        {"email": "signer@example.com", "esignUrl": "https://x/sign"}
                    ]}
                ]
            }));
        })
        .await;

    let service = service_for(&server);
    let request = SendAgreementRequest {
        recipient_email: Some("signer@example.com".to_string()),
        agreement_name: Some("Quarterly MSA".to_string()),
        ..SendAgreementRequest::default()
    };

    let response = service.send_agreement(&request).await.unwrap();

    assert_eq!(response.agreement_id, "agr-1");
    assert_eq!(response.signing_url.as_deref(), Some("https://x/sign"));
    assert_eq!(
        response.sender_view_url.as_deref(),
        Some("https://sign.example.com/view/agr-1")
    );
    assert!(response.expires_at.is_some());

    assert_eq!(upload.hits_async().await, 1);
    assert_eq!(create.hits_async().await, 1);
    assert_eq!(signing_urls.hits_async().await, 1);

    // The default document is embedded, so a temp copy was materialized and
    // must be gone now.
    assert!(temp_artifacts().is_empty());
}

#[tokio::test]
#[serial]
async fn empty_signing_url_sets_yield_a_null_signing_url() {
    let server = MockServer::start_async().await;
    mock_token_endpoint(&server).await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/transientDocuments");
            then.status(200)
                .json_body(json!({ "transientDocumentId": "doc-123" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/agreements");
            then.status(200).json_body(json!({ "id": "agr-2" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/agreements/agr-2/signingUrls");
            then.status(200).json_body(json!({ "signingUrlSetInfos": [] }));
        })
        .await;

    let service = service_for(&server);
    let response = service
        .send_agreement(&SendAgreementRequest::default())
        .await
        .unwrap();

    assert_eq!(response.agreement_id, "agr-2");
    assert!(response.signing_url.is_none());
    assert!(response.expires_at.is_none());
    assert!(response.sender_view_url.is_none());
}

#[tokio::test]
#[serial]
async fn mid_pipeline_failure_cleans_up_the_temporary_document() {
    let server = MockServer::start_async().await;
    mock_token_endpoint(&server).await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/transientDocuments");
            then.status(200)
                .json_body(json!({ "transientDocumentId": "doc-123" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/agreements");
            then.status(500).body("boom");
        })
        .await;

    let before = temp_artifacts();
    let service = service_for(&server);
    let err = service
        .send_agreement(&SendAgreementRequest::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SignError::Client { .. }));
    // The materialized copy must not outlive the failed call.
    assert_eq!(temp_artifacts(), before);
}

#[tokio::test]
#[serial]
async fn missing_transient_document_id_is_a_client_error() {
    let server = MockServer::start_async().await;
    mock_token_endpoint(&server).await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/transientDocuments");
            then.status(200).json_body(json!({ "transientDocumentId": "" }));
        })
        .await;

    let service = service_for(&server);
    let err = service
        .send_agreement(&SendAgreementRequest::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SignError::Client { .. }));
    assert!(err.to_string().contains("transientDocumentId"));
}

#[tokio::test]
#[serial]
async fn token_refresh_failure_surfaces_as_a_client_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(401).body("invalid refresh token");
        })
        .await;

    let upload = server
        .mock_async(|when, then| {
            when.method(POST).path("/transientDocuments");
            then.status(200)
                .json_body(json!({ "transientDocumentId": "doc-123" }));
        })
        .await;

    let service = service_for(&server);
    let err = service
        .send_agreement(&SendAgreementRequest::default())
        .await
        .unwrap_err();

    // Token trouble is an upstream failure from the API caller's point of
    // view; the auth cause stays on the source chain for the logs.
    assert!(matches!(err, SignError::Client { .. }));
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(upload.hits_async().await, 0);
    assert!(temp_artifacts().is_empty());
}

#[actix_web::test]
#[serial]
async fn token_refresh_failure_maps_to_502_at_the_endpoint() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(401).body("invalid refresh token");
        })
        .await;

    let service = web::Data::new(service_for(&server));
    let app = test::init_service(
        App::new()
            .app_data(service)
            .route("/api/agreements/send", web::post().to(send_agreement)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/agreements/send")
        .set_json(json!({ "recipientEmail": "signer@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let parsed: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(parsed["error"], "bad_gateway");
}
