use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use signbridge::{
    agreements::AgreementService,
    handlers::{health, send_agreement, webhook_get, webhook_post},
    oauth::TokenCache,
    settings::SignbridgeSettings,
    webhooks::WebhookVerifier,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables.
    // This also loads .env and initializes the logger.
    let settings = SignbridgeSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    start_server(settings).await
}

/// Start the server
///
/// # Errors
///
/// Returns an error if server binding or startup fails.
async fn start_server(settings: SignbridgeSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address);

    // One token cache shared by all workers; it is the only shared mutable
    // state in the service.
    let token_cache = Arc::new(TokenCache::from_settings(&settings.adobe_sign));
    let agreement_service = web::Data::new(AgreementService::new(
        settings.adobe_sign.clone(),
        Arc::clone(&token_cache),
    ));
    let webhook_verifier = web::Data::new(WebhookVerifier::from_settings(&settings.adobe_sign));

    HttpServer::new(move || {
        App::new()
            .app_data(agreement_service.clone())
            .app_data(webhook_verifier.clone())
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Agreement endpoint
        .route("/api/agreements/send", web::post().to(send_agreement))
        // Webhook endpoints (GET serves the reachability handshake)
        .route("/api/webhooks/adobesign", web::post().to(webhook_post))
        .route("/api/webhooks/adobesign", web::get().to(webhook_get))
        // Health endpoint
        .route("/ping", web::get().to(health));
}

fn print_startup_info(bind_address: &str) {
    println!("Starting signbridge Adobe Sign integration on http://{bind_address}");
    println!();
    println!("Endpoints:");
    println!("  POST /api/agreements/send    - Upload and route a document for signature");
    println!("  POST /api/webhooks/adobesign - Adobe Sign webhook notifications");
    println!("  GET  /api/webhooks/adobesign - Adobe Sign webhook handshake");
    println!("  GET  /ping                   - Health check");
}
