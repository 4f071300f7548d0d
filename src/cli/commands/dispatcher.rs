//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::error::{LedgerflowError, Result};
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Report a failed run through the UI and pick the exit code its
    /// classification calls for.
    ///
    /// Timeouts are shown as warnings and exit 0.
    pub fn from_error(error: &LedgerflowError, ui: &mut dyn UserInterface) -> Self {
        let kind = error.kind();
        let policy = kind.exit_policy();
        let line = format!("{}: {}", kind, error);

        if policy.exit_code() == 0 {
            ui.warning(&line);
        } else {
            ui.error(&line);
        }

        Self::failure(policy.exit_code())
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            config_path: None,
        }
    }

    /// Use an explicit config file instead of the project default.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it. No subcommand runs the default trade flow.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config_path = self.config_path.as_deref();

        match &cli.command {
            Some(Commands::Run(args)) => {
                let cmd = super::run::RunCommand::new(&self.project_root, config_path, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Flows(args)) => {
                let cmd =
                    super::flows::FlowsCommand::new(&self.project_root, config_path, args.clone());
                cmd.execute(ui)
            }
            None => {
                let cmd =
                    super::run::RunCommand::new(&self.project_root, config_path, RunArgs::default());
                cmd.execute(ui)
            }
        }
    }
}
