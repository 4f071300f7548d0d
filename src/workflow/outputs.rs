//! Validated snapshots produced by completed steps.

use crate::error::{LedgerflowError, Result};
use crate::resource::ResourceSnapshot;

/// Ordered map from step name to the snapshot that step produced.
///
/// A resource is stored once. When a later step re-fetches a resource an
/// earlier step produced (same kind and id), the newer snapshot replaces the
/// older one and both step names resolve to it.
#[derive(Debug, Clone, Default)]
pub struct StepOutputs {
    snapshots: Vec<ResourceSnapshot>,
    names: Vec<(String, usize)>,
}

impl StepOutputs {
    /// Create an empty set of outputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the snapshot produced by `step`.
    pub fn insert(&mut self, step: &str, snapshot: ResourceSnapshot) {
        let slot = match self
            .snapshots
            .iter()
            .position(|s| s.kind() == snapshot.kind() && s.id() == snapshot.id())
        {
            Some(index) => {
                self.snapshots[index] = snapshot;
                index
            }
            None => {
                self.snapshots.push(snapshot);
                self.snapshots.len() - 1
            }
        };

        match self.names.iter_mut().find(|(name, _)| name == step) {
            Some(entry) => entry.1 = slot,
            None => self.names.push((step.to_string(), slot)),
        }
    }

    /// Snapshot produced by `step`, if it has run.
    pub fn get(&self, step: &str) -> Option<&ResourceSnapshot> {
        self.names
            .iter()
            .find(|(name, _)| name == step)
            .map(|(_, slot)| &self.snapshots[*slot])
    }

    /// Snapshot produced by `step`.
    ///
    /// # Errors
    ///
    /// A step that depends on one which has not run is a workflow
    /// definition error, reported as a configuration error.
    pub fn require(&self, step: &str) -> Result<&ResourceSnapshot> {
        self.get(step).ok_or_else(|| {
            LedgerflowError::config(format!("no output recorded for step '{}'", step))
        })
    }

    /// Identifier of the resource produced by `step`.
    pub fn id_of(&self, step: &str) -> Result<&str> {
        Ok(self.require(step)?.id())
    }

    /// Step names in the order they completed.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|(name, _)| name.as_str())
    }

    /// Step names paired with their snapshots, in completion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceSnapshot)> {
        self.names
            .iter()
            .map(|(name, slot)| (name.as_str(), &self.snapshots[*slot]))
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no step has completed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resource::ResourceKind;

    fn account(id: &str, balance: i64) -> ResourceSnapshot {
        ResourceSnapshot::new(ResourceKind::Account, id, "created")
            .with_attribute("platform_balance", balance)
    }

    #[test]
    fn records_in_completion_order() {
        let mut outputs = StepOutputs::new();
        outputs.insert("customer", ResourceSnapshot::new(ResourceKind::Customer, "c1", "unverified"));
        outputs.insert("fiat_account", account("a1", 0));

        let names: Vec<_> = outputs.names().collect();
        assert_eq!(names, vec!["customer", "fiat_account"]);
        assert_eq!(outputs.id_of("fiat_account").unwrap(), "a1");
        assert_eq!(outputs.len(), 2);
    }

    #[test]
    fn refetch_replaces_earlier_snapshot() {
        let mut outputs = StepOutputs::new();
        outputs.insert("fiat_account", account("a1", 0));
        outputs.insert("fiat_balance", account("a1", 100_000));

        let earlier = outputs.get("fiat_account").unwrap();
        assert_eq!(earlier.attr_amount("platform_balance").unwrap(), 100_000);
        assert_eq!(outputs.len(), 2);
    }

    #[test]
    fn same_id_different_kind_is_separate() {
        let mut outputs = StepOutputs::new();
        outputs.insert("quote", ResourceSnapshot::new(ResourceKind::Quote, "x1", "created"));
        outputs.insert("trade", ResourceSnapshot::new(ResourceKind::Trade, "x1", "completed"));

        assert_eq!(outputs.get("quote").unwrap().kind(), ResourceKind::Quote);
        assert_eq!(outputs.get("trade").unwrap().kind(), ResourceKind::Trade);
    }

    #[test]
    fn missing_step_is_configuration_error() {
        let outputs = StepOutputs::new();
        assert!(outputs.get("customer").is_none());
        let err = outputs.require("customer").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(outputs.is_empty());
    }
}
