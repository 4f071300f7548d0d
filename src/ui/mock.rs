//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use ledgerflow::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("Starting run");
//! let mut spinner = ui.start_spinner("customer");
//! spinner.finish_success("customer");
//!
//! assert!(ui.messages().contains(&"Starting run".to_string()));
//! assert!(ui.has_spinner_result("success: customer"));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::workflow::WorkflowReport;

use super::{OutputMode, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    progress: Vec<(usize, usize)>,
    spinners: Vec<String>,
    spinner_results: Rc<RefCell<Vec<String>>>,
    reports: Vec<String>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self {
            mode: OutputMode::Normal,
            ..Default::default()
        }
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Get all captured messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get all captured success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Get all captured warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get all captured error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all captured headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get all captured progress updates.
    pub fn progress(&self) -> &[(usize, usize)] {
        &self.progress
    }

    /// Get all spinner messages that were started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Get how each spinner finished, as `"success: msg"`, `"error: msg"`,
    /// or `"warning: msg"`.
    pub fn spinner_results(&self) -> Vec<String> {
        self.spinner_results.borrow().clone()
    }

    /// Names of the workflows whose reports were shown.
    pub fn reports(&self) -> &[String] {
        &self.reports
    }

    /// Check if a specific message was shown.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific success was shown.
    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific warning was shown.
    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific error was shown.
    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    /// Check if a spinner finished with a matching result.
    pub fn has_spinner_result(&self, result: &str) -> bool {
        self.spinner_results
            .borrow()
            .iter()
            .any(|r| r.contains(result))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner::new(Rc::clone(&self.spinner_results)))
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        self.progress.push((current, total));
    }

    fn show_report(&mut self, report: &WorkflowReport) {
        self.reports.push(report.workflow.clone());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Mock spinner that records how it finished.
#[derive(Debug, Default)]
pub struct MockSpinner {
    results: Rc<RefCell<Vec<String>>>,
    message: String,
}

impl MockSpinner {
    /// Create a spinner recording into `results`.
    pub fn new(results: Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            results,
            message: String::new(),
        }
    }

    /// The last message set.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.message = msg.to_string();
    }

    fn finish_success(&mut self, msg: &str) {
        self.results.borrow_mut().push(format!("success: {}", msg));
    }

    fn finish_error(&mut self, msg: &str) {
        self.results.borrow_mut().push(format!("error: {}", msg));
    }

    fn finish_warning(&mut self, msg: &str) {
        self.results.borrow_mut().push(format!("warning: {}", msg));
    }
}
