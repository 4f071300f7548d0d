//! Run-wide context handed to every step.

use std::fmt;

use crate::client::ResourceClient;
use crate::config::FlowConfig;
use crate::poll::Clock;

/// Everything a step may use: the validated configuration, the ledger
/// client, and the time source.
///
/// Assembled once before the first step runs and never mutated.
pub struct FlowContext<'a> {
    /// Validated configuration.
    pub config: &'a FlowConfig,
    /// Ledger collaborator.
    pub client: &'a dyn ResourceClient,
    /// Time source for convergence waits.
    pub clock: &'a dyn Clock,
}

impl<'a> FlowContext<'a> {
    /// Create a context.
    pub fn new(
        config: &'a FlowConfig,
        client: &'a dyn ResourceClient,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            config,
            client,
            clock,
        }
    }
}

impl fmt::Debug for FlowContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowContext")
            .field("api_url", &self.config.api_url)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
