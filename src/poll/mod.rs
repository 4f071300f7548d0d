//! Convergence polling.
//!
//! This module waits for asynchronously created ledger resources to settle:
//!
//! - [`wait`] - Re-fetch a resource until it reaches a terminal state
//! - [`validate`] - Accept only the step's success state
//! - [`Clock`] - Time source ([`SystemClock`] in production, [`ManualClock`] in tests)
//! - [`LazyMessage`] - Diagnostics rendered only when displayed
//!
//! # Example
//!
//! ```
//! use ledgerflow::poll::{validate, wait, ManualClock, PollSchedule};
//! use ledgerflow::resource::{ResourceKind, ResourceSnapshot};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let initial = ResourceSnapshot::new(ResourceKind::Account, "acc_1", "storing");
//! let schedule = PollSchedule::new(Duration::from_secs(10), Duration::from_secs(1));
//!
//! let result = wait(&clock, initial, &ResourceKind::Account.terminal_set(), schedule, |id| {
//!     Ok(ResourceSnapshot::new(ResourceKind::Account, id, "created"))
//! })
//! .unwrap();
//!
//! let account = validate(result, "created").unwrap();
//! assert_eq!(account.state(), "created");
//! ```

pub mod clock;
pub mod diagnostic;
pub mod outcome;
pub mod waiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use diagnostic::LazyMessage;
pub use outcome::validate;
pub use waiter::{wait, wait_with_observer, PollResult, PollSchedule};
