//! Error types for ledgerflow operations.
//!
//! This module defines [`LedgerflowError`], the single error type raised by
//! every part of a workflow run, and the classifier that maps each error to
//! an [`ErrorKind`] and an [`ExitPolicy`].
//!
//! # Error Handling Strategy
//!
//! - Steps never catch errors; they return them with `?`
//! - The orchestrator tags the failing step with [`LedgerflowError::in_step`]
//! - The top level calls [`LedgerflowError::kind`] once to decide how to exit
//! - Use `anyhow::Error` (via `LedgerflowError::Other`) for unexpected errors

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::poll::LazyMessage;

/// Core error type for ledgerflow operations.
#[derive(Debug, Error)]
pub enum LedgerflowError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A request to the ledger or token endpoint failed.
    #[error("Request failed{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// A resource did not reach a terminal state before the deadline.
    #[error(
        "Timed out after {}s waiting for {resource} ({last_observed})",
        .elapsed.as_secs()
    )]
    Timeout {
        resource: String,
        elapsed: Duration,
        last_observed: LazyMessage,
    },

    /// A resource reached a terminal state other than the one the step needs.
    #[error("{resource} reached state '{actual}', expected '{expected}'")]
    UnexpectedState {
        resource: String,
        expected: String,
        actual: String,
    },

    /// A post-condition check failed.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// An error raised while a named step was running.
    #[error("Step '{step}' failed: {source}")]
    Step {
        step: String,
        source: Box<LedgerflowError>,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with HTTP {}", code),
        None => String::new(),
    }
}

/// Result type alias for ledgerflow operations.
pub type Result<T> = std::result::Result<T, LedgerflowError>;

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The collaborator's request itself failed.
    Transport,
    /// The convergence deadline passed.
    Timeout,
    /// A resource converged to the wrong terminal state.
    UnexpectedState,
    /// A post-condition check failed.
    Validation,
    /// The run could not be assembled (bad config or step definitions).
    Configuration,
}

impl ErrorKind {
    /// What the process does when a run ends with this kind of error.
    pub fn exit_policy(&self) -> ExitPolicy {
        match self {
            ErrorKind::Timeout => ExitPolicy::Graceful,
            ErrorKind::Configuration => ExitPolicy::Fail(2),
            ErrorKind::Transport | ErrorKind::UnexpectedState | ErrorKind::Validation => {
                ExitPolicy::Fail(1)
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Transport => "TransportError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::UnexpectedState => "UnexpectedStateError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Configuration => "ConfigurationError",
        };
        write!(f, "{}", s)
    }
}

/// How a failed run ends the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Log the failure and exit 0.
    Graceful,
    /// Log the failure and exit with the given code.
    Fail(i32),
}

impl ExitPolicy {
    /// Process exit code for this policy.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitPolicy::Graceful => 0,
            ExitPolicy::Fail(code) => *code,
        }
    }
}

impl LedgerflowError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerflowError::ConfigNotFound { .. }
            | LedgerflowError::ConfigParseError { .. }
            | LedgerflowError::ConfigValidationError { .. } => ErrorKind::Configuration,
            LedgerflowError::Transport { .. } => ErrorKind::Transport,
            LedgerflowError::Timeout { .. } => ErrorKind::Timeout,
            LedgerflowError::UnexpectedState { .. } => ErrorKind::UnexpectedState,
            LedgerflowError::Validation { .. } => ErrorKind::Validation,
            LedgerflowError::Step { source, .. } => source.kind(),
            // Only the collaborator does IO or raises opaque errors mid-run.
            LedgerflowError::Io(_) | LedgerflowError::Other(_) => ErrorKind::Transport,
        }
    }

    /// Name of the step that raised this error, if known.
    pub fn step(&self) -> Option<&str> {
        match self {
            LedgerflowError::Step { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Tag this error with the step that raised it.
    ///
    /// An error already tagged keeps its original step.
    pub fn in_step(self, step: &str) -> Self {
        match self {
            LedgerflowError::Step { .. } => self,
            other => LedgerflowError::Step {
                step: step.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Shorthand for a transport error without an HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        LedgerflowError::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerflowError::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a configuration validation error.
    pub fn config(message: impl Into<String>) -> Self {
        LedgerflowError::ConfigValidationError {
            message: message.into(),
        }
    }
}
