//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. A missing subcommand runs the
//! default trade flow.

pub mod dispatcher;
pub mod flows;
pub mod run;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
pub use flows::FlowsCommand;
pub use run::RunCommand;
