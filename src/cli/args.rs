//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ledgerflow - Drive ledger workflows end to end and check the balances.
#[derive(Debug, Parser)]
#[command(name = "ledgerflow")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default .ledgerflow/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show every poll
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a workflow against the ledger (default if no command specified)
    Run(RunArgs),

    /// List the workflows and their steps
    Flows(FlowsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Workflow to run: trade, transfer, or multi-asset
    #[arg(short, long, default_value = "trade")]
    pub flow: String,

    /// Use bank-attested identity verification
    #[arg(long)]
    pub attested: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            flow: "trade".to_string(),
            attested: false,
        }
    }
}

/// Arguments for the `flows` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FlowsArgs {
    /// Show only one workflow
    #[arg(long)]
    pub flow: Option<String>,
}
