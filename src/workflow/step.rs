//! Step definitions.
//!
//! A step is data: how to create its resource, how to re-fetch it, which
//! states end the wait, which of those counts as success, and an optional
//! post-condition. Steps are assembled with [`WorkflowStep::builder`], which
//! enforces the step invariants up front.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::{LedgerflowError, Result};
use crate::poll::PollSchedule;
use crate::resource::{ResourceKind, ResourceSnapshot};

use super::context::FlowContext;
use super::outputs::StepOutputs;

/// Creates the step's resource from the run context and earlier outputs.
pub type CreateFn = Box<dyn Fn(&FlowContext<'_>, &StepOutputs) -> Result<ResourceSnapshot>>;

/// Re-fetches the step's resource by id.
pub type RefreshFn = Box<dyn Fn(&FlowContext<'_>, &str) -> Result<ResourceSnapshot>>;

/// Post-condition on the validated snapshot.
pub type CheckFn = Box<dyn Fn(&FlowContext<'_>, &StepOutputs, &ResourceSnapshot) -> Result<()>>;

/// One unit of a workflow.
pub struct WorkflowStep {
    name: String,
    kind: ResourceKind,
    create: CreateFn,
    refresh: RefreshFn,
    check: Option<CheckFn>,
    terminal_states: BTreeSet<String>,
    success_state: String,
    schedule: PollSchedule,
}

impl WorkflowStep {
    /// Start building a step that produces a resource of `kind`.
    pub fn builder(name: impl Into<String>, kind: ResourceKind) -> WorkflowStepBuilder {
        WorkflowStepBuilder::new(name, kind)
    }

    /// Step name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of resource the step produces.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// States that end the wait.
    pub fn terminal_states(&self) -> &BTreeSet<String> {
        &self.terminal_states
    }

    /// The terminal state that counts as success.
    pub fn success_state(&self) -> &str {
        &self.success_state
    }

    /// Timeout and poll interval.
    pub fn schedule(&self) -> PollSchedule {
        self.schedule
    }

    /// Create the step's resource.
    pub fn create(&self, ctx: &FlowContext<'_>, outputs: &StepOutputs) -> Result<ResourceSnapshot> {
        (self.create)(ctx, outputs)
    }

    /// Re-fetch the step's resource.
    pub fn refresh(&self, ctx: &FlowContext<'_>, id: &str) -> Result<ResourceSnapshot> {
        (self.refresh)(ctx, id)
    }

    /// Run the post-condition, if any.
    pub fn check(
        &self,
        ctx: &FlowContext<'_>,
        outputs: &StepOutputs,
        snapshot: &ResourceSnapshot,
    ) -> Result<()> {
        match &self.check {
            Some(check) => check(ctx, outputs, snapshot),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowStep")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("terminal_states", &self.terminal_states)
            .field("success_state", &self.success_state)
            .field("schedule", &self.schedule)
            .field("has_check", &self.check.is_some())
            .finish()
    }
}

/// Builder for [`WorkflowStep`].
///
/// Terminal states and the success state default to the kind's table; the
/// refresh defaults to a `get` through the context's client.
pub struct WorkflowStepBuilder {
    name: String,
    kind: ResourceKind,
    create: Option<CreateFn>,
    refresh: Option<RefreshFn>,
    check: Option<CheckFn>,
    terminal_states: BTreeSet<String>,
    success_state: String,
    schedule: PollSchedule,
}

impl WorkflowStepBuilder {
    fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            create: None,
            refresh: None,
            check: None,
            terminal_states: kind.terminal_set(),
            success_state: kind.success_state().to_string(),
            schedule: PollSchedule::default(),
        }
    }

    /// How to create the resource.
    pub fn create<F>(mut self, create: F) -> Self
    where
        F: Fn(&FlowContext<'_>, &StepOutputs) -> Result<ResourceSnapshot> + 'static,
    {
        self.create = Some(Box::new(create));
        self
    }

    /// How to re-fetch the resource.
    pub fn refresh<F>(mut self, refresh: F) -> Self
    where
        F: Fn(&FlowContext<'_>, &str) -> Result<ResourceSnapshot> + 'static,
    {
        self.refresh = Some(Box::new(refresh));
        self
    }

    /// Post-condition run after the success state is confirmed.
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&FlowContext<'_>, &StepOutputs, &ResourceSnapshot) -> Result<()> + 'static,
    {
        self.check = Some(Box::new(check));
        self
    }

    /// Replace the terminal set.
    pub fn terminal_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminal_states = states.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the success state.
    pub fn success_state(mut self, state: impl Into<String>) -> Self {
        self.success_state = state.into();
        self
    }

    /// Timeout and poll interval.
    pub fn schedule(mut self, schedule: PollSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Build the step.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no create function was given, the
    /// terminal set is empty, the success state is not terminal, or the
    /// poll interval is zero.
    pub fn build(self) -> Result<WorkflowStep> {
        let create = self.create.ok_or_else(|| {
            LedgerflowError::config(format!("step '{}' has no create function", self.name))
        })?;

        if self.terminal_states.is_empty() {
            return Err(LedgerflowError::config(format!(
                "step '{}' has no terminal states",
                self.name
            )));
        }

        if !self.terminal_states.contains(&self.success_state) {
            return Err(LedgerflowError::config(format!(
                "step '{}': success state '{}' is not one of its terminal states",
                self.name, self.success_state
            )));
        }

        if self.schedule.poll_interval.is_zero() {
            return Err(LedgerflowError::config(format!(
                "step '{}' has a zero poll interval",
                self.name
            )));
        }

        let kind = self.kind;
        let refresh: RefreshFn = match self.refresh {
            Some(refresh) => refresh,
            None => Box::new(move |ctx: &FlowContext<'_>, id: &str| ctx.client.get(kind, id)),
        };

        Ok(WorkflowStep {
            name: self.name,
            kind,
            create,
            refresh,
            check: self.check,
            terminal_states: self.terminal_states,
            success_state: self.success_state,
            schedule: self.schedule,
        })
    }
}

/// A named, ordered list of steps.
#[derive(Debug)]
pub struct Workflow {
    name: String,
    steps: Vec<WorkflowStep>,
}

impl Workflow {
    /// Create a workflow.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the workflow is empty or two steps
    /// share a name.
    pub fn new(name: impl Into<String>, steps: Vec<WorkflowStep>) -> Result<Self> {
        let name = name.into();

        if steps.is_empty() {
            return Err(LedgerflowError::config(format!(
                "workflow '{}' has no steps",
                name
            )));
        }

        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.name()) {
                return Err(LedgerflowError::config(format!(
                    "workflow '{}' defines step '{}' twice",
                    name,
                    step.name()
                )));
            }
        }

        Ok(Self { name, steps })
    }

    /// Workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(WorkflowStep::name).collect()
    }
}
