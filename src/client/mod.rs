//! Ledger API access.
//!
//! The workflow engine talks to the remote ledger only through the
//! [`ResourceClient`] trait. [`HttpResourceClient`] is the production
//! implementation; tests substitute scripted clients.
//!
//! - [`ResourceClient`] - create / get / list for every [`ResourceKind`]
//! - [`HttpResourceClient`] - Blocking `reqwest` binding of the trait
//! - [`TokenProvider`] - OAuth2 client-credentials token acquisition

pub mod auth;
pub mod http;

pub use auth::{AccessToken, TokenProvider};
pub use http::HttpResourceClient;

use serde_json::Value;

use crate::error::Result;
use crate::resource::{ResourceKind, ResourceSnapshot};

/// Narrow interface to the remote ledger.
///
/// Every method may fail with a transport error carrying the HTTP status and
/// the ledger's message. Idempotency of `create` is the ledger's concern.
pub trait ResourceClient {
    /// Create a resource and return it in whatever state the ledger reports.
    fn create(&self, kind: ResourceKind, parameters: &Value) -> Result<ResourceSnapshot>;

    /// Fetch the current state of one resource.
    fn get(&self, kind: ResourceKind, id: &str) -> Result<ResourceSnapshot>;

    /// List resources of one kind, in the ledger's order.
    fn list(&self, kind: ResourceKind) -> Result<Vec<ResourceSnapshot>>;
}
