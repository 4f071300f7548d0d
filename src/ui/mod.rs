//! Terminal output.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for terminal usage, [`MockUI`] for tests
//! - [`RunProgressDisplay`], which turns orchestrator events into spinners
//!
//! # Example
//!
//! ```
//! use ledgerflow::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.show_header("ledgerflow");
//! ui.success("Run complete");
//! assert!(ui.has_success("complete"));
//! ```

pub mod mock;
pub mod output;
pub mod progress;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI};
pub use output::OutputMode;
pub use progress::{format_duration, RunProgressDisplay};
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, LedgerflowTheme};

use crate::workflow::WorkflowReport;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message. Shown in every mode.
    fn error(&mut self, msg: &str);

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Show progress (e.g., "Step 3 of 7").
    fn show_progress(&mut self, current: usize, total: usize);

    /// Show the per-step summary of a completed run.
    fn show_report(&mut self, report: &WorkflowReport);

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Mark the operation as successful.
    fn finish_success(&mut self, msg: &str);

    /// Mark the operation as failed.
    fn finish_error(&mut self, msg: &str);

    /// Mark the operation as ended without success or failure.
    fn finish_warning(&mut self, msg: &str);
}
