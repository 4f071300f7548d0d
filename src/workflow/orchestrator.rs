//! Sequential step execution.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, info_span, warn};

use crate::error::{ErrorKind, LedgerflowError, Result};
use crate::poll::{validate, wait_with_observer};
use crate::resource::{ResourceKind, ResourceSnapshot};

use super::context::FlowContext;
use super::outputs::StepOutputs;
use super::step::{Workflow, WorkflowStep};

/// Progress events emitted during a run.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A step is about to create its resource.
    StepStarting {
        name: &'a str,
        index: usize,
        total: usize,
    },
    /// A step's resource was re-fetched and is still settling, or just settled.
    StepPolling {
        name: &'a str,
        snapshot: &'a ResourceSnapshot,
        elapsed: Duration,
    },
    /// A step's resource reached its success state and passed its check.
    StepFinished {
        name: &'a str,
        report: &'a StepReport,
    },
    /// A step failed; the run stops here.
    StepFailed {
        name: &'a str,
        error: &'a LedgerflowError,
    },
}

/// What one completed step produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Step name.
    pub name: String,
    /// Kind of resource produced.
    pub kind: ResourceKind,
    /// Identifier of the resource.
    pub resource_id: String,
    /// Final (success) state.
    pub state: String,
    /// Time spent waiting for convergence.
    pub elapsed: Duration,
    /// Number of re-fetches made while waiting.
    pub fetches: u32,
    /// Total time for the step, creation included.
    pub duration: Duration,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct WorkflowReport {
    /// Workflow name.
    pub workflow: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// One report per step, in order.
    pub steps: Vec<StepReport>,
    /// Validated snapshots by step name.
    pub outputs: StepOutputs,
    /// Total duration.
    pub duration: Duration,
}

/// Runs workflows against one [`FlowContext`].
///
/// Steps run strictly in order. The first failure stops the run and is
/// returned tagged with the step name; nothing is rolled back.
pub struct Orchestrator<'a> {
    context: FlowContext<'a>,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator.
    pub fn new(context: FlowContext<'a>) -> Self {
        Self { context }
    }

    /// The run context.
    pub fn context(&self) -> &FlowContext<'a> {
        &self.context
    }

    /// Run a workflow.
    pub fn run(&self, workflow: &Workflow) -> Result<WorkflowReport> {
        self.run_with_progress(workflow, |_| {})
    }

    /// Run a workflow with a progress callback.
    pub fn run_with_progress(
        &self,
        workflow: &Workflow,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<WorkflowReport> {
        let started_at = Utc::now();
        let start = self.context.clock.now();
        let total = workflow.steps().len();

        info!(workflow = workflow.name(), steps = total, "starting workflow");

        let mut outputs = StepOutputs::new();
        let mut reports = Vec::with_capacity(total);

        for (index, step) in workflow.steps().iter().enumerate() {
            let span = info_span!("step", name = step.name());
            let _guard = span.enter();

            on_progress(RunProgress::StepStarting {
                name: step.name(),
                index,
                total,
            });

            match self.run_step(step, &outputs, &mut on_progress) {
                Ok((snapshot, report)) => {
                    info!(
                        resource = %snapshot.label(),
                        state = snapshot.state(),
                        fetches = report.fetches,
                        "step finished"
                    );
                    on_progress(RunProgress::StepFinished {
                        name: step.name(),
                        report: &report,
                    });
                    outputs.insert(step.name(), snapshot);
                    reports.push(report);
                }
                Err(e) => {
                    let e = e.in_step(step.name());
                    match e.kind() {
                        ErrorKind::Timeout => warn!(kind = %e.kind(), "{}", e),
                        _ => error!(kind = %e.kind(), "{}", e),
                    }
                    on_progress(RunProgress::StepFailed {
                        name: step.name(),
                        error: &e,
                    });
                    return Err(e);
                }
            }
        }

        let duration = self.context.clock.now().saturating_duration_since(start);
        info!(workflow = workflow.name(), ?duration, "workflow complete");

        Ok(WorkflowReport {
            workflow: workflow.name().to_string(),
            started_at,
            steps: reports,
            outputs,
            duration,
        })
    }

    fn run_step(
        &self,
        step: &WorkflowStep,
        outputs: &StepOutputs,
        on_progress: &mut dyn FnMut(RunProgress<'_>),
    ) -> Result<(ResourceSnapshot, StepReport)> {
        let ctx = &self.context;
        let start = ctx.clock.now();

        let created = step.create(ctx, outputs)?;
        if created.kind() != step.kind() {
            return Err(LedgerflowError::transport(format!(
                "expected a {} but the ledger returned {}",
                step.kind(),
                created.label()
            )));
        }

        let result = wait_with_observer(
            ctx.clock,
            created,
            step.terminal_states(),
            step.schedule(),
            |id| step.refresh(ctx, id),
            |snapshot, elapsed| {
                on_progress(RunProgress::StepPolling {
                    name: step.name(),
                    snapshot,
                    elapsed,
                })
            },
        )?;

        let elapsed = result.elapsed;
        let fetches = result.fetches;
        let snapshot = validate(result, step.success_state())?;

        step.check(ctx, outputs, &snapshot)?;

        let report = StepReport {
            name: step.name().to_string(),
            kind: snapshot.kind(),
            resource_id: snapshot.id().to_string(),
            state: snapshot.state().to_string(),
            elapsed,
            fetches,
            duration: ctx.clock.now().saturating_duration_since(start),
        };

        Ok((snapshot, report))
    }
}
