//! Adobe Sign integration service: agreement sending and webhook ingestion

/// Version of the signbridge application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod agreements;
pub mod documents;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod settings;
pub mod utils;
pub mod webhooks;

/// Re-export commonly used items
pub use agreements::AgreementService;
pub use errors::SignError;
pub use handlers::{health, send_agreement, webhook_get, webhook_post};
pub use oauth::TokenCache;
pub use settings::SignbridgeSettings;
pub use webhooks::{WebhookOutcome, WebhookVerifier};
