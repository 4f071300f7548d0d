//! Convergence waiting.
//!
//! A freshly created ledger resource starts in a non-terminal state. The
//! waiter re-fetches it at a fixed interval until its state lands in the
//! caller's terminal set or an overall deadline passes.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::{LedgerflowError, Result};
use crate::resource::ResourceSnapshot;

use super::clock::Clock;
use super::diagnostic::LazyMessage;

/// How long to wait and how often to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Overall deadline, measured from the start of the wait.
    pub timeout: Duration,
    /// Fixed pause between fetches.
    pub poll_interval: Duration,
}

impl PollSchedule {
    /// Create a schedule.
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(1))
    }
}

/// Outcome of one wait.
#[derive(Debug, Clone)]
pub struct PollResult {
    /// The last snapshot observed (terminal unless `timed_out`).
    pub final_snapshot: ResourceSnapshot,
    /// Time from the start of the wait to the final observation.
    pub elapsed: Duration,
    /// Whether the deadline passed before a terminal state was seen.
    pub timed_out: bool,
    /// Number of refresh calls made.
    pub fetches: u32,
}

impl PollResult {
    /// Describe the last observation without rendering it yet.
    pub fn diagnostic(&self) -> LazyMessage {
        let last = self.final_snapshot.clone();
        LazyMessage::new(move || format!("last observed {}", last.describe()))
    }
}

/// Wait for `initial` to reach one of `terminal_states`.
///
/// See [`wait_with_observer`].
pub fn wait<F>(
    clock: &dyn Clock,
    initial: ResourceSnapshot,
    terminal_states: &BTreeSet<String>,
    schedule: PollSchedule,
    refresh: F,
) -> Result<PollResult>
where
    F: FnMut(&str) -> Result<ResourceSnapshot>,
{
    wait_with_observer(clock, initial, terminal_states, schedule, refresh, |_, _| {})
}

/// Wait for `initial` to reach one of `terminal_states`, reporting every
/// intermediate snapshot to `on_poll`.
///
/// Returns immediately without fetching when `initial` is already terminal.
/// Otherwise sleeps `poll_interval`, calls `refresh` with the resource id,
/// and repeats until the state is terminal. The deadline is wall-clock time
/// from the call, so slow fetches count against it; the last sleep is
/// shortened so the wait never overshoots. A fetch that returns at or past
/// the deadline is a miss even if its state is terminal. A deadline miss is
/// reported as `timed_out` with the last snapshot seen.
///
/// Errors from `refresh` are returned as-is and are not retried.
pub fn wait_with_observer<F, O>(
    clock: &dyn Clock,
    initial: ResourceSnapshot,
    terminal_states: &BTreeSet<String>,
    schedule: PollSchedule,
    mut refresh: F,
    mut on_poll: O,
) -> Result<PollResult>
where
    F: FnMut(&str) -> Result<ResourceSnapshot>,
    O: FnMut(&ResourceSnapshot, Duration),
{
    let start = clock.now();

    if initial.is_in(terminal_states) {
        debug!(resource = %initial.label(), state = initial.state(), "already terminal");
        return Ok(PollResult {
            final_snapshot: initial,
            elapsed: Duration::ZERO,
            timed_out: false,
            fetches: 0,
        });
    }

    let mut current = initial;
    let mut fetches = 0u32;

    loop {
        let elapsed = clock.now().saturating_duration_since(start);
        if elapsed >= schedule.timeout {
            debug!(
                resource = %current.label(),
                state = current.state(),
                fetches,
                "deadline passed before convergence"
            );
            return Ok(PollResult {
                final_snapshot: current,
                elapsed,
                timed_out: true,
                fetches,
            });
        }

        clock.sleep(schedule.poll_interval.min(schedule.timeout - elapsed));

        let next = refresh(current.id())?;
        fetches += 1;

        if next.id() != current.id() || next.kind() != current.kind() {
            return Err(LedgerflowError::transport(format!(
                "refreshing {} returned {}",
                current.label(),
                next.label()
            )));
        }

        if !next.kind().knows_state(next.state()) {
            warn!(resource = %next.label(), state = next.state(), "state not in vocabulary");
        }

        let elapsed = clock.now().saturating_duration_since(start);
        trace!(resource = %next.label(), state = next.state(), fetch = fetches, "polled");
        on_poll(&next, elapsed);
        current = next;

        // A fetch that returns after the deadline does not count, whatever it saw.
        if elapsed >= schedule.timeout {
            debug!(
                resource = %current.label(),
                state = current.state(),
                fetches,
                elapsed_ms = elapsed.as_millis() as u64,
                "fetch returned past the deadline"
            );
            return Ok(PollResult {
                final_snapshot: current,
                elapsed,
                timed_out: true,
                fetches,
            });
        }

        if current.is_in(terminal_states) {
            debug!(
                resource = %current.label(),
                state = current.state(),
                fetches,
                elapsed_ms = elapsed.as_millis() as u64,
                "converged"
            );
            return Ok(PollResult {
                final_snapshot: current,
                elapsed,
                timed_out: false,
                fetches,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::poll::ManualClock;
    use crate::resource::ResourceKind;
    use std::collections::VecDeque;

    fn terminal() -> BTreeSet<String> {
        ResourceKind::Customer.terminal_set()
    }

    fn customer(state: &str) -> ResourceSnapshot {
        ResourceSnapshot::new(ResourceKind::Customer, "cus_1", state)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn already_terminal_returns_without_fetching() {
        let clock = ManualClock::new();
        let result = wait(
            &clock,
            customer("unverified"),
            &terminal(),
            PollSchedule::new(secs(10), secs(1)),
            |_| panic!("must not refresh"),
        )
        .unwrap();

        assert!(!result.timed_out);
        assert_eq!(result.elapsed, Duration::ZERO);
        assert_eq!(result.fetches, 0);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn converges_on_third_fetch() {
        let clock = ManualClock::new();
        let mut states: VecDeque<&str> = VecDeque::from(["storing", "storing", "unverified"]);

        let result = wait(
            &clock,
            customer("storing"),
            &terminal(),
            PollSchedule::new(secs(10), secs(1)),
            |id| Ok(ResourceSnapshot::new(ResourceKind::Customer, id, states.pop_front().unwrap())),
        )
        .unwrap();

        assert!(!result.timed_out);
        assert_eq!(result.final_snapshot.state(), "unverified");
        assert_eq!(result.elapsed, secs(3));
        assert_eq!(result.fetches, 3);
        assert!(states.is_empty());
    }

    #[test]
    fn times_out_with_last_snapshot() {
        let clock = ManualClock::new();
        let result = wait(
            &clock,
            customer("storing"),
            &terminal(),
            PollSchedule::new(secs(2), secs(1)),
            |id| Ok(ResourceSnapshot::new(ResourceKind::Customer, id, "storing")),
        )
        .unwrap();

        assert!(result.timed_out);
        assert_eq!(result.elapsed, secs(2));
        assert_eq!(result.fetches, 2);
        assert_eq!(result.final_snapshot.state(), "storing");
    }

    #[test]
    fn last_sleep_is_clamped_to_deadline() {
        let clock = ManualClock::new();
        let result = wait(
            &clock,
            customer("storing"),
            &terminal(),
            PollSchedule::new(Duration::from_millis(2500), secs(1)),
            |id| Ok(ResourceSnapshot::new(ResourceKind::Customer, id, "storing")),
        )
        .unwrap();

        assert!(result.timed_out);
        assert_eq!(result.elapsed, Duration::from_millis(2500));
        assert_eq!(result.fetches, 3);
    }

    #[test]
    fn slow_fetches_count_against_deadline() {
        let clock = ManualClock::new();
        let result = wait(
            &clock,
            customer("storing"),
            &terminal(),
            PollSchedule::new(secs(5), secs(1)),
            |id| {
                clock.advance(secs(2));
                Ok(ResourceSnapshot::new(ResourceKind::Customer, id, "storing"))
            },
        )
        .unwrap();

        assert!(result.timed_out);
        assert_eq!(result.fetches, 2);
        assert_eq!(result.elapsed, secs(6));
    }

    #[test]
    fn terminal_state_fetched_after_deadline_is_a_timeout() {
        let clock = ManualClock::new();
        let result = wait(
            &clock,
            customer("storing"),
            &terminal(),
            PollSchedule::new(secs(2), secs(1)),
            |id| {
                clock.advance(secs(5));
                Ok(ResourceSnapshot::new(ResourceKind::Customer, id, "unverified"))
            },
        )
        .unwrap();

        assert!(result.timed_out);
        assert_eq!(result.fetches, 1);
        assert_eq!(result.elapsed, secs(6));
        assert_eq!(result.final_snapshot.state(), "unverified");
    }

    #[test]
    fn terminal_state_fetched_before_deadline_converges() {
        let clock = ManualClock::new();
        let result = wait(
            &clock,
            customer("storing"),
            &terminal(),
            PollSchedule::new(secs(5), secs(1)),
            |id| {
                clock.advance(secs(2));
                Ok(ResourceSnapshot::new(ResourceKind::Customer, id, "unverified"))
            },
        )
        .unwrap();

        assert!(!result.timed_out);
        assert_eq!(result.elapsed, secs(3));
    }

    #[test]
    fn unknown_state_keeps_polling() {
        assert!(!ResourceKind::Customer.knows_state("archived"));
        let clock = ManualClock::new();
        let result = wait(
            &clock,
            customer("storing"),
            &terminal(),
            PollSchedule::new(secs(3), secs(1)),
            |id| Ok(ResourceSnapshot::new(ResourceKind::Customer, id, "archived")),
        )
        .unwrap();

        assert!(result.timed_out);
        assert_eq!(result.fetches, 3);
        assert_eq!(result.final_snapshot.state(), "archived");
    }

    #[test]
    fn refresh_errors_propagate_without_retry() {
        let clock = ManualClock::new();
        let mut calls = 0;
        let err = wait(
            &clock,
            customer("storing"),
            &terminal(),
            PollSchedule::new(secs(10), secs(1)),
            |_| {
                calls += 1;
                Err(LedgerflowError::Transport {
                    status: Some(503),
                    message: "unavailable".into(),
                })
            },
        )
        .unwrap_err();

        assert_eq!(calls, 1);
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn refresh_returning_other_resource_is_rejected() {
        let clock = ManualClock::new();
        let err = wait(
            &clock,
            customer("storing"),
            &terminal(),
            PollSchedule::default(),
            |_| Ok(ResourceSnapshot::new(ResourceKind::Customer, "cus_2", "unverified")),
        )
        .unwrap_err();

        assert!(err.to_string().contains("cus_2"));
    }

    #[test]
    fn observer_sees_every_fetch() {
        let clock = ManualClock::new();
        let mut states: VecDeque<&str> = VecDeque::from(["storing", "verified"]);
        let mut seen = Vec::new();

        wait_with_observer(
            &clock,
            customer("storing"),
            &terminal(),
            PollSchedule::new(secs(10), secs(1)),
            |id| Ok(ResourceSnapshot::new(ResourceKind::Customer, id, states.pop_front().unwrap())),
            |snapshot, elapsed| seen.push((snapshot.state().to_string(), elapsed)),
        )
        .unwrap();

        assert_eq!(
            seen,
            vec![
                ("storing".to_string(), secs(1)),
                ("verified".to_string(), secs(2))
            ]
        );
    }

    #[test]
    fn diagnostic_describes_last_snapshot() {
        let result = PollResult {
            final_snapshot: customer("storing"),
            elapsed: secs(2),
            timed_out: true,
            fetches: 2,
        };
        let message = result.diagnostic().render();
        assert!(message.contains("customer cus_1"));
        assert!(message.contains("'storing'"));
    }
}
