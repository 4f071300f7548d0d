//! Terminal UI.

use console::Term;
use std::io::Write;

use crate::workflow::WorkflowReport;

use super::progress::format_duration;
use super::{
    should_use_colors, LedgerflowTheme, OutputMode, ProgressSpinner, SpinnerHandle, UserInterface,
};

/// Terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    err_term: Term,
    theme: LedgerflowTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode, colors: bool) -> Self {
        Self {
            term: Term::stdout(),
            err_term: Term::stderr(),
            theme: LedgerflowTheme::for_colors(colors),
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err_term, "{}", self.theme.format_error(msg)).ok();
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() && self.term.is_term() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(LineSpinner {
                term: self.term.clone(),
                theme: self.theme.clone(),
                show: self.mode.shows_status(),
            })
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        if self.mode.shows_status() && !self.term.is_term() {
            writeln!(
                self.term,
                "{}",
                self.theme.dim.apply_to(format!("[{}/{}]", current, total))
            )
            .ok();
        }
    }

    fn show_report(&mut self, report: &WorkflowReport) {
        if !self.mode.shows_summary() {
            return;
        }

        let b = &self.theme.border;

        writeln!(self.term).ok();
        writeln!(
            self.term,
            "  {} {}",
            b.apply_to("┌─"),
            b.apply_to("Summary ──────────────────────────")
        )
        .ok();

        for step in &report.steps {
            writeln!(
                self.term,
                "  {} {:<30} {:<26} {}",
                b.apply_to("│"),
                step.name,
                self.theme
                    .dim
                    .apply_to(format!("{} {}", step.kind, step.resource_id)),
                self.theme.duration.apply_to(format_duration(step.duration)),
            )
            .ok();
        }

        writeln!(
            self.term,
            "  {}",
            b.apply_to("├────────────────────────────────────")
        )
        .ok();
        writeln!(
            self.term,
            "  {} Total: {} {} {} steps {} started {}",
            b.apply_to("│"),
            self.theme.duration.apply_to(format_duration(report.duration)),
            self.theme.dim.apply_to("·"),
            report.steps.len(),
            self.theme.dim.apply_to("·"),
            report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
        .ok();
        writeln!(
            self.term,
            "  {}",
            b.apply_to("└────────────────────────────────────")
        )
        .ok();
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Spinner stand-in for non-terminal output: prints only the final line.
struct LineSpinner {
    term: Term,
    theme: LedgerflowTheme,
    show: bool,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.show {
            writeln!(self.term, "  {}", self.theme.format_success(msg)).ok();
        }
    }

    fn finish_error(&mut self, msg: &str) {
        writeln!(self.term, "  {}", self.theme.format_error(msg)).ok();
    }

    fn finish_warning(&mut self, msg: &str) {
        if self.show {
            writeln!(self.term, "  {}", self.theme.format_warning(msg)).ok();
        }
    }
}

/// Create the terminal UI for a run.
pub fn create_ui(mode: OutputMode, no_color: bool) -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new(mode, !no_color && should_use_colors()))
}
