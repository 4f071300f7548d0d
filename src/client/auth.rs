//! OAuth2 client-credentials token acquisition.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{LedgerflowError, Result};

use super::http::{build_client, transport_error};

/// Bearer token for the ledger API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(****)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Fetches bearer tokens from `<auth_url>/oauth/token`.
pub struct TokenProvider {
    client: Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
}

impl TokenProvider {
    /// Create a provider for the given endpoint and credentials.
    pub fn new(
        auth_url: &str,
        client_id: &str,
        client_secret: &str,
        scopes: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scopes,
        })
    }

    /// Token endpoint URL.
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.auth_url)
    }

    /// Request a fresh token.
    pub fn fetch_token(&self) -> Result<AccessToken> {
        let url = self.token_url();
        debug!(url = %url, scopes = self.scopes.len(), "requesting access token");

        let body = json!({
            "grant_type": "client_credentials",
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "scope": self.scopes.join(" "),
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| transport_error("requesting token", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(LedgerflowError::Transport {
                status: Some(status.as_u16()),
                message: format!("token request rejected: {}", text.trim()),
            });
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| transport_error("decoding token response", e))?;

        if token.access_token.is_empty() {
            return Err(LedgerflowError::transport("token response had an empty access_token"));
        }

        Ok(AccessToken::new(token.access_token))
    }
}
