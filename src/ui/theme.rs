//! Visual theme and styling.

use console::Style;

/// ledgerflow's visual theme.
#[derive(Debug, Clone)]
pub struct LedgerflowTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for running elements (cyan).
    pub info: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted/important text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
    /// Style for durations (dim).
    pub duration: Style,
    /// Style for box-drawing borders (dim).
    pub border: Style,
}

impl Default for LedgerflowTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerflowTheme {
    /// Create the default theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            info: Style::new().cyan(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            duration: Style::new().dim(),
            border: Style::new().dim(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            duration: Style::new(),
            border: Style::new(),
        }
    }

    /// Pick the colored or plain theme.
    pub fn for_colors(colors: bool) -> Self {
        if colors {
            Self::new()
        } else {
            Self::plain()
        }
    }

    /// Format a success message (icon + text in green).
    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    /// Format a warning message (icon + text in orange).
    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    /// Format an error message (icon + text in red bold).
    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Format a header banner.
    pub fn format_header(&self, title: &str) -> String {
        format!("{} {}", self.header.apply_to("◆"), self.highlight.apply_to(title))
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_formats_success() {
        let msg = LedgerflowTheme::plain().format_success("Complete");
        assert_eq!(msg, "✓ Complete");
    }

    #[test]
    fn theme_formats_warning() {
        let msg = LedgerflowTheme::plain().format_warning("Timed out");
        assert!(msg.contains("⚠"));
        assert!(msg.contains("Timed out"));
    }

    #[test]
    fn theme_formats_error() {
        let msg = LedgerflowTheme::plain().format_error("Failed");
        assert_eq!(msg, "✗ Failed");
    }

    #[test]
    fn theme_formats_header() {
        let msg = LedgerflowTheme::plain().format_header("trade flow");
        assert!(msg.contains("trade flow"));
    }

    #[test]
    fn default_impl_matches_new() {
        let default = LedgerflowTheme::default();
        let new = LedgerflowTheme::new();
        assert_eq!(default.format_success("test"), new.format_success("test"));
    }
}
