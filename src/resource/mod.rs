//! Remote ledger resources.
//!
//! - [`ResourceKind`] - The resource types and their state vocabularies
//! - [`ResourceSnapshot`] - An immutable view of one resource as of one fetch

pub mod kind;
pub mod snapshot;

pub use kind::ResourceKind;
pub use snapshot::ResourceSnapshot;
