//! Run progress display.

use std::time::Duration;

use crate::error::ErrorKind;
use crate::workflow::RunProgress;

use super::{SpinnerHandle, UserInterface};

/// Renders orchestrator events: one spinner per step, updated on every
/// poll and finished with the step's outcome.
pub struct RunProgressDisplay<'a> {
    ui: &'a mut dyn UserInterface,
    spinner: Option<Box<dyn SpinnerHandle>>,
}

impl<'a> RunProgressDisplay<'a> {
    /// Create a display writing to `ui`.
    pub fn new(ui: &'a mut dyn UserInterface) -> Self {
        Self { ui, spinner: None }
    }

    /// Handle one event.
    pub fn handle(&mut self, event: RunProgress<'_>) {
        match event {
            RunProgress::StepStarting { name, index, total } => {
                self.ui.show_progress(index + 1, total);
                self.spinner = Some(self.ui.start_spinner(name));
            }
            RunProgress::StepPolling {
                name,
                snapshot,
                elapsed,
            } => {
                let line = format!(
                    "{} - {} ({})",
                    name,
                    snapshot.state(),
                    format_duration(elapsed)
                );
                if self.ui.output_mode().shows_polls() {
                    self.ui.message(&format!("    {}", line));
                }
                if let Some(spinner) = &mut self.spinner {
                    spinner.set_message(&line);
                }
            }
            RunProgress::StepFinished { name, report } => {
                let line = format!(
                    "{} - {} {} ({})",
                    name,
                    report.kind,
                    report.resource_id,
                    format_duration(report.duration)
                );
                if let Some(mut spinner) = self.spinner.take() {
                    spinner.finish_success(&line);
                }
            }
            RunProgress::StepFailed { name, error } => {
                let line = format!("{} - {}", name, error.kind());
                if let Some(mut spinner) = self.spinner.take() {
                    match error.kind() {
                        ErrorKind::Timeout => spinner.finish_warning(&line),
                        _ => spinner.finish_error(&line),
                    }
                }
            }
        }
    }
}

/// Format a duration for display.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}
