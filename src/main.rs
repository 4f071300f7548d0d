//! Ledgerflow CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use ledgerflow::cli::{Cli, CommandDispatcher, CommandResult};
use ledgerflow::ui::{create_ui, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("ledgerflow=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ledgerflow=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("ledgerflow starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let mut ui = create_ui(output_mode, cli.no_color);

    let project_root = std::env::current_dir().unwrap_or_default();
    let dispatcher = CommandDispatcher::new(project_root).with_config_path(cli.config.clone());

    let result = match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => result,
        Err(e) => CommandResult::from_error(&e, ui.as_mut()),
    };

    ExitCode::from(result.exit_code as u8)
}
