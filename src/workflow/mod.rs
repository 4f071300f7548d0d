//! Workflow definition and orchestration.
//!
//! - [`WorkflowStep`] / [`Workflow`] - Steps as data, assembled with a builder
//! - [`FlowContext`] - Config, client, and clock shared by every step
//! - [`StepOutputs`] - Validated snapshots threaded between steps
//! - [`Orchestrator`] - Runs steps in order and stops at the first failure

pub mod context;
pub mod orchestrator;
pub mod outputs;
pub mod step;

pub use context::FlowContext;
pub use orchestrator::{Orchestrator, RunProgress, StepReport, WorkflowReport};
pub use outputs::StepOutputs;
pub use step::{CheckFn, CreateFn, RefreshFn, Workflow, WorkflowStep, WorkflowStepBuilder};
