//! Step outcome validation.

use crate::error::{LedgerflowError, Result};
use crate::resource::ResourceSnapshot;

use super::waiter::PollResult;

/// Turn a wait outcome into the step's resolved snapshot.
///
/// Converging is not the same as succeeding: a resource can settle in a
/// terminal failure state. This returns the snapshot only when it settled in
/// `success_state`; a deadline miss is a [`LedgerflowError::Timeout`] and any
/// other terminal state is a [`LedgerflowError::UnexpectedState`].
pub fn validate(result: PollResult, success_state: &str) -> Result<ResourceSnapshot> {
    if result.timed_out {
        let last_observed = result.diagnostic();
        return Err(LedgerflowError::Timeout {
            resource: result.final_snapshot.label(),
            elapsed: result.elapsed,
            last_observed,
        });
    }

    let snapshot = result.final_snapshot;
    if snapshot.state() != success_state {
        return Err(LedgerflowError::UnexpectedState {
            resource: snapshot.label(),
            expected: success_state.to_string(),
            actual: snapshot.state().to_string(),
        });
    }

    Ok(snapshot)
}
