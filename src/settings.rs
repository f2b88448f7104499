use std::fs;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SignbridgeSettings {
    pub application: ApplicationSettings,
    pub logging: LoggingSettings,
    pub adobe_sign: AdobeSignSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

/// Integration-account settings for the Adobe Sign REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdobeSignSettings {
    /// REST v6 base, e.g. `https://api.na1.adobesign.com/api/rest/v6`
    pub base_uri: String,
    /// OAuth token endpoint for refresh-token grants
    pub oauth_token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Fallback recipients used when the request names none
    pub default_recipient_emails: Vec<String>,
    pub default_agreement_name: String,
    /// Document sent when the request carries no `documentPath`. Supports
    /// plain filesystem paths and the `embedded:` scheme for documents
    /// bundled into the binary.
    pub test_document_path: String,
    /// HMAC secret for webhook signature verification. When unset, inbound
    /// webhook signatures are not checked (degraded mode, logged as a
    /// warning).
    pub webhook_signing_secret: Option<String>,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for AdobeSignSettings {
    fn default() -> Self {
        Self {
            base_uri: String::new(),
            oauth_token_uri:
                "https://secure.na1.adobesign.us/api/gateway/adobesignauthservice/api/v1/token"
                    .to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            default_recipient_emails: Vec::new(),
            default_agreement_name: "Adobe Sign Test Agreement".to_string(),
            test_document_path: "embedded:sample-agreement.docx".to_string(),
            webhook_signing_secret: None,
        }
    }
}

impl SignbridgeSettings {
    /// Load settings from Settings.toml and environment variables
    ///
    /// Priority, highest to lowest: environment variables, Settings.toml in
    /// the working directory, built-in defaults. Also loads a `.env` file
    /// and initializes the logger.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed, or if
    /// required Adobe Sign settings are missing or malformed.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_env_file();
        let _ = env_logger::try_init();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    fn load_base_settings() -> anyhow::Result<Self> {
        let config_path = std::path::PathBuf::from("Settings.toml");
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let toml_content = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let settings = basic_toml::from_str(&toml_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        log::info!("Loaded base settings from {}", config_path.display());
        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_logging_env_overrides(&mut settings.logging);
        Self::apply_adobe_sign_env_overrides(&mut settings.adobe_sign);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Apply environment overrides for the Adobe Sign integration account
    pub fn apply_adobe_sign_env_overrides(adobe_settings: &mut AdobeSignSettings) {
        Self::apply_string_env_override("ADOBE_SIGN_BASE_URI", &mut adobe_settings.base_uri);
        Self::apply_string_env_override(
            "ADOBE_SIGN_OAUTH_TOKEN_URI",
            &mut adobe_settings.oauth_token_uri,
        );
        Self::apply_string_env_override("ADOBE_SIGN_CLIENT_ID", &mut adobe_settings.client_id);
        Self::apply_string_env_override(
            "ADOBE_SIGN_CLIENT_SECRET",
            &mut adobe_settings.client_secret,
        );
        Self::apply_string_env_override(
            "ADOBE_SIGN_REFRESH_TOKEN",
            &mut adobe_settings.refresh_token,
        );
        if let Ok(secret) = std::env::var("ADOBE_SIGN_WEBHOOK_SECRET") {
            if secret.is_empty() {
                adobe_settings.webhook_signing_secret = None;
            } else {
                adobe_settings.webhook_signing_secret = Some(secret);
            }
        }
    }

    fn apply_string_env_override(env_var: &str, target: &mut String) {
        if let Ok(value) = std::env::var(env_var) {
            if !value.is_empty() {
                *target = value;
            }
        }
    }

    /// Validate the settings required to talk to Adobe Sign
    ///
    /// # Errors
    ///
    /// Returns an error if a required value is blank or a URI does not parse.
    pub fn validate(&self) -> anyhow::Result<()> {
        let adobe = &self.adobe_sign;
        Url::parse(&adobe.base_uri)
            .with_context(|| format!("adobe_sign.base_uri is not a valid URL: '{}'", adobe.base_uri))?;
        Url::parse(&adobe.oauth_token_uri).with_context(|| {
            format!(
                "adobe_sign.oauth_token_uri is not a valid URL: '{}'",
                adobe.oauth_token_uri
            )
        })?;
        anyhow::ensure!(
            !adobe.client_id.trim().is_empty(),
            "adobe_sign.client_id is required"
        );
        anyhow::ensure!(
            !adobe.client_secret.trim().is_empty(),
            "adobe_sign.client_secret is required"
        );
        Ok(())
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }
}
