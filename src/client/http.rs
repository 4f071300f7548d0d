//! HTTP binding of the ledger API.
//!
//! Resources live under `<api_url>/api/<collection>`. Creation is a `POST`
//! of a JSON body, retrieval a `GET` by id, listing a `GET` of the
//! collection. Every request carries the bearer token.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::error::{LedgerflowError, Result};
use crate::resource::{ResourceKind, ResourceSnapshot};

use super::auth::AccessToken;
use super::ResourceClient;

/// Page size requested when listing.
const LIST_PAGE_SIZE: u32 = 100;

/// Build a blocking client with the crate's user agent and timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("ledgerflow/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| transport_error("building HTTP client", e))
}

/// Convert a `reqwest` failure into a transport error.
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> LedgerflowError {
    LedgerflowError::Transport {
        status: err.status().map(|s| s.as_u16()),
        message: format!("{}: {}", context, err),
    }
}

/// Ledger client over HTTP/HTTPS.
pub struct HttpResourceClient {
    client: Client,
    base_url: String,
    token: AccessToken,
    timeout: Duration,
}

impl HttpResourceClient {
    /// Create a client for `base_url` authenticated with `token`.
    pub fn new(base_url: &str, token: AccessToken, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout,
        })
    }

    /// Get the configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL of a kind's collection.
    pub fn collection_url(&self, kind: ResourceKind) -> String {
        format!("{}/api/{}", self.base_url, kind.collection())
    }

    /// URL of a single resource.
    pub fn resource_url(&self, kind: ResourceKind, id: &str) -> String {
        format!("{}/{}", self.collection_url(kind), id)
    }

    fn send(&self, request: RequestBuilder, action: &str) -> Result<Value> {
        let response = request
            .bearer_auth(self.token.secret())
            .header("Accept", "application/json")
            .send()
            .map_err(|e| transport_error(action, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LedgerflowError::Transport {
                status: Some(status.as_u16()),
                message: format!("{}: {}", action, error_message(&body)),
            });
        }

        response
            .json()
            .map_err(|e| transport_error(&format!("{}: decoding response", action), e))
    }
}

impl ResourceClient for HttpResourceClient {
    fn create(&self, kind: ResourceKind, parameters: &Value) -> Result<ResourceSnapshot> {
        let url = self.collection_url(kind);
        debug!(kind = %kind, url = %url, "creating resource");
        let body = self.send(
            self.client.post(&url).json(parameters),
            &format!("creating {}", kind),
        )?;
        ResourceSnapshot::from_json(kind, body)
    }

    fn get(&self, kind: ResourceKind, id: &str) -> Result<ResourceSnapshot> {
        let url = self.resource_url(kind, id);
        let body = self.send(self.client.get(&url), &format!("fetching {} {}", kind, id))?;
        ResourceSnapshot::from_json(kind, body)
    }

    fn list(&self, kind: ResourceKind) -> Result<Vec<ResourceSnapshot>> {
        let url = format!("{}?per_page={}", self.collection_url(kind), LIST_PAGE_SIZE);
        debug!(kind = %kind, url = %url, "listing resources");
        let body = self.send(self.client.get(&url), &format!("listing {}", kind.collection()))?;

        let items = match body {
            Value::Array(items) => items,
            Value::Object(mut page) => match page.remove("objects") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(LedgerflowError::transport(format!(
                        "listing {}: response has no 'objects' array",
                        kind.collection()
                    )))
                }
            },
            _ => {
                return Err(LedgerflowError::transport(format!(
                    "listing {}: unexpected response shape",
                    kind.collection()
                )))
            }
        };

        items
            .into_iter()
            .map(|item| ResourceSnapshot::from_json(kind, item))
            .collect()
    }
}

/// Pull the human-readable part out of an error body.
///
/// The ledger answers failures with `{"message": ..., "message_code": ...}`;
/// anything else is passed through verbatim.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    match (field("message"), field("message_code")) {
        (Some(message), Some(code)) => format!("{} ({})", message, code),
        (Some(message), None) => message,
        (None, Some(code)) => code,
        (None, None) if body.trim().is_empty() => "empty response body".to_string(),
        (None, None) => body.trim().to_string(),
    }
}
