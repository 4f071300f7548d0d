//! Ledgerflow - Drive multi-step ledger workflows and verify the results.
//!
//! Ledgerflow creates customers, accounts, quotes, trades and transfers on
//! a remote ledger whose resources settle asynchronously. Each step waits
//! for its resource to reach a terminal state, checks that it is the right
//! one, and hands the result to the next step. Balances are compared in
//! integer subunits.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`client`] - The ledger collaborator and its HTTP binding
//! - [`config`] - Configuration loading, overrides, and validation
//! - [`error`] - Error types, classification, and exit policy
//! - [`flows`] - The trade, transfer, and multi-asset workflows
//! - [`money`] - Assets and subunit amounts
//! - [`poll`] - Waiting for resources to converge
//! - [`resource`] - Resource kinds and snapshots
//! - [`ui`] - Spinners, summaries, and terminal output
//! - [`workflow`] - Steps and the orchestrator that runs them
//!
//! # Example
//!
//! ```
//! use ledgerflow::config::FlowConfig;
//! use ledgerflow::flows::{plan, FlowKind};
//!
//! let steps = plan(FlowKind::Transfer, &FlowConfig::default()).unwrap();
//! assert_eq!(steps.first().map(String::as_str), Some("verification_key"));
//! assert_eq!(steps.last().map(String::as_str), Some("fiat_balance_after_withdrawal"));
//! ```
//!
//! For runs against a scripted ledger, see the integration tests.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod flows;
pub mod money;
pub mod poll;
pub mod resource;
pub mod ui;
pub mod workflow;

pub use error::{LedgerflowError, Result};
