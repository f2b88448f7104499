//! Adobe Sign OAuth access-token cache
//!
//! Holds a single cached access token per integration account and refreshes
//! it with the configured refresh token. Readers take the fast path (a read
//! lock, no awaiting) while a valid token exists; refreshers serialize on an
//! async single-flight gate and re-check the cache before calling out, so at
//! most one refresh round trip happens per expiry cycle no matter how many
//! requests race past the expiry boundary.

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;

use crate::errors::SignError;
use crate::settings::AdobeSignSettings;

/// Tokens within this margin of expiry are treated as already expired, so a
/// token handed out is always valid for at least this long.
const TOKEN_EXPIRY_SAFETY_SECONDS: i64 = 30;

/// Immutable access token; replaced, never mutated, on refresh
#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(TOKEN_EXPIRY_SAFETY_SECONDS)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
    refresh_token: Option<String>,
}

/// Cached OAuth token source for all Adobe Sign REST calls
pub struct TokenCache {
    token_uri: String,
    client_id: String,
    client_secret: String,
    http_client: reqwest::Client,
    /// Rotated in place when a token response supplies a replacement
    refresh_token: Mutex<String>,
    cached: RwLock<Option<AccessToken>>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl TokenCache {
    #[must_use]
    pub fn from_settings(settings: &AdobeSignSettings) -> Self {
        Self {
            token_uri: settings.oauth_token_uri.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            http_client: reqwest::Client::new(),
            refresh_token: Mutex::new(settings.refresh_token.clone()),
            cached: RwLock::new(None),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Get a bearer token valid for at least the safety margin.
    ///
    /// # Errors
    ///
    /// Fails with `SignError::Auth` if no refresh token is configured or the
    /// refresh call fails. A failed refresh leaves any previously cached
    /// token in place; it is only replaced by a successful refresh.
    pub async fn access_token(&self) -> Result<String, SignError> {
        // Fast path: no synchronization beyond the read lock.
        if let Some(value) = self.cached_if_fresh() {
            return Ok(value);
        }

        // Slow path: many callers may race past the fast path at once, so
        // re-check under the gate before refreshing.
        let _gate = self.refresh_gate.lock().await;
        if let Some(value) = self.cached_if_fresh() {
            return Ok(value);
        }

        let token = self.fetch_new_token().await?;
        let value = token.value.clone();
        *self.cached.write() = Some(token);
        Ok(value)
    }

    fn cached_if_fresh(&self) -> Option<String> {
        let guard = self.cached.read();
        guard
            .as_ref()
            .filter(|token| token.is_fresh(Utc::now()))
            .map(|token| token.value.clone())
    }

    async fn fetch_new_token(&self) -> Result<AccessToken, SignError> {
        let refresh_token = self.refresh_token.lock().clone();
        if refresh_token.trim().is_empty() {
            return Err(SignError::auth("No refresh token configured for Adobe Sign."));
        }

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        log::debug!("Refreshing Adobe Sign access token");
        let response = self
            .http_client
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| SignError::auth_caused("Failed to call the Adobe Sign OAuth endpoint", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Adobe Sign token refresh returned {status}: {body}");
            return Err(SignError::auth(format!(
                "Adobe Sign token refresh failed with status {status}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| SignError::auth_caused("Failed to parse Adobe Sign token response", e))?;

        let value = token_response
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| SignError::auth("Failed to retrieve access token from Adobe Sign."))?;

        if let Some(rotated) = token_response
            .refresh_token
            .filter(|token| !token.trim().is_empty())
        {
            log::debug!("Adobe Sign rotated the refresh token");
            *self.refresh_token.lock() = rotated;
        }

        let lifetime_seconds = token_response
            .expires_in
            .max(TOKEN_EXPIRY_SAFETY_SECONDS);
        Ok(AccessToken {
            value,
            expires_at: Utc::now() + Duration::seconds(lifetime_seconds),
        })
    }

    #[cfg(test)]
    fn seed_token(&self, value: &str, expires_at: DateTime<Utc>) {
        *self.cached.write() = Some(AccessToken {
            value: value.to_string(),
            expires_at,
        });
    }

    #[cfg(test)]
    fn cached_value(&self) -> Option<String> {
        self.cached.read().as_ref().map(|t| t.value.clone())
    }

    #[cfg(test)]
    fn current_refresh_token(&self) -> String {
        self.refresh_token.lock().clone()
    }
}
