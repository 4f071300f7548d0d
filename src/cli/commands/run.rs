//! Run command implementation.
//!
//! The `ledgerflow run` command drives one flow against the ledger.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cli::args::RunArgs;
use crate::client::{HttpResourceClient, ResourceClient, TokenProvider};
use crate::config::{load_config, FlowConfig, IdentityMethod};
use crate::error::{LedgerflowError, Result};
use crate::flows::{self, FlowKind};
use crate::poll::{Clock, SystemClock};
use crate::ui::{RunProgressDisplay, UserInterface};
use crate::workflow::{FlowContext, Orchestrator, Workflow};

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    env: HashMap<String, String>,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command reading overrides from the process environment.
    pub fn new(project_root: &Path, config_path: Option<&Path>, args: RunArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path: config_path.map(Path::to_path_buf),
            env: std::env::vars().collect(),
            args,
        }
    }

    /// Replace the environment used for config overrides.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Load the configuration and build the requested flow.
    ///
    /// Everything here happens before any request reaches the ledger.
    fn prepare(&self) -> Result<(FlowConfig, Workflow)> {
        let kind: FlowKind = self
            .args
            .flow
            .parse()
            .map_err(LedgerflowError::config)?;

        let mut config = load_config(&self.project_root, self.config_path.as_deref(), &self.env)?;
        if self.args.attested {
            config.identity = IdentityMethod::Attested;
        }

        let workflow = flows::build(kind, &config)?;
        Ok((config, workflow))
    }

    /// Authenticate and bind the HTTP client.
    fn connect(config: &FlowConfig) -> Result<HttpResourceClient> {
        let (client_id, client_secret) = config.credentials()?;
        let provider = TokenProvider::new(
            config.auth_url()?,
            client_id,
            client_secret,
            config.scopes.clone(),
            config.request_timeout(),
        )?;
        let token = provider.fetch_token()?;
        debug!(url = %provider.token_url(), "authenticated");

        HttpResourceClient::new(config.api_url()?, token, config.request_timeout())
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let (config, workflow) = match self.prepare() {
            Ok(prepared) => prepared,
            Err(e) => return Ok(CommandResult::from_error(&e, ui)),
        };

        ui.show_header(&format!("Running {} flow", workflow.name()));

        let client = match Self::connect(&config) {
            Ok(client) => client,
            Err(e) => return Ok(CommandResult::from_error(&e, ui)),
        };

        Ok(run_workflow(&workflow, &config, &client, &SystemClock, ui))
    }
}

/// Run a built workflow with progress output and turn the outcome into a
/// [`CommandResult`].
pub fn run_workflow(
    workflow: &Workflow,
    config: &FlowConfig,
    client: &dyn ResourceClient,
    clock: &dyn Clock,
    ui: &mut dyn UserInterface,
) -> CommandResult {
    let context = FlowContext::new(config, client, clock);
    info!(flow = workflow.name(), identity = %config.identity, "context ready");
    let orchestrator = Orchestrator::new(context);

    let result = {
        let mut display = RunProgressDisplay::new(&mut *ui);
        orchestrator.run_with_progress(workflow, |event| display.handle(event))
    };

    match result {
        Ok(report) => {
            ui.show_report(&report);
            ui.success(&format!(
                "{} flow completed: {} steps",
                report.workflow,
                report.steps.len()
            ));
            CommandResult::success()
        }
        Err(e) => CommandResult::from_error(&e, ui),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::{CONFIG_DIR, CONFIG_FILE};
    use crate::poll::ManualClock;
    use crate::resource::{ResourceKind, ResourceSnapshot};
    use crate::ui::MockUI;
    use crate::workflow::WorkflowStep;
    use serde_json::Value;
    use std::cell::RefCell;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
bank_guid: bank_1
api_url: https://bank.example.com
client_id: id
client_secret: secret
"#;

    fn setup_project(config: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONFIG_FILE), config).unwrap();
        temp
    }

    fn command(root: &Path, args: RunArgs) -> RunCommand {
        RunCommand::new(root, None, args).with_env(HashMap::new())
    }

    /// Returns each scripted state in turn, repeating the last.
    struct Scripted {
        states: RefCell<Vec<&'static str>>,
    }

    impl Scripted {
        fn new(states: &[&'static str]) -> Self {
            Self {
                states: RefCell::new(states.to_vec()),
            }
        }

        fn next(&self) -> &'static str {
            let mut states = self.states.borrow_mut();
            if states.len() > 1 {
                states.remove(0)
            } else {
                states[0]
            }
        }
    }

    impl ResourceClient for Scripted {
        fn create(&self, kind: ResourceKind, _: &Value) -> Result<ResourceSnapshot> {
            Ok(ResourceSnapshot::new(kind, "res_1", self.next()))
        }

        fn get(&self, kind: ResourceKind, id: &str) -> Result<ResourceSnapshot> {
            Ok(ResourceSnapshot::new(kind, id, self.next()))
        }

        fn list(&self, _: ResourceKind) -> Result<Vec<ResourceSnapshot>> {
            Ok(Vec::new())
        }
    }

    fn single_trade_workflow(timeout: Duration) -> Workflow {
        let step = WorkflowStep::builder("buy_trade_btc", ResourceKind::Trade)
            .create(|ctx, _| ctx.client.create(ResourceKind::Trade, &Value::Null))
            .schedule(crate::poll::PollSchedule::new(timeout, Duration::from_secs(1)))
            .build()
            .unwrap();
        Workflow::new("trade", vec![step]).unwrap()
    }

    #[test]
    fn run_command_creation() {
        let temp = TempDir::new().unwrap();
        let cmd = command(temp.path(), RunArgs::default());
        assert_eq!(cmd.project_root(), temp.path());
        assert_eq!(cmd.args().flow, "trade");
    }

    #[test]
    fn execute_with_no_config_exits_two() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = command(temp.path(), RunArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, 2);
        assert!(ui.has_error("ConfigurationError"));
    }

    #[test]
    fn execute_with_unknown_flow_exits_two() {
        let temp = setup_project(CONFIG);
        let mut ui = MockUI::new();
        let args = RunArgs {
            flow: "refund".into(),
            ..Default::default()
        };

        let result = command(temp.path(), args).execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 2);
        assert!(ui.has_error("refund"));
    }

    #[test]
    fn multi_asset_without_wallets_fails_before_any_request() {
        let temp = setup_project(CONFIG);
        let mut ui = MockUI::new();
        let args = RunArgs {
            flow: "multi-asset".into(),
            ..Default::default()
        };

        let result = command(temp.path(), args).execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 2);
        assert!(ui.has_error("wallet_addresses"));
        assert!(ui.headers().is_empty());
    }

    #[test]
    fn attested_flag_overrides_config() {
        let temp = setup_project(CONFIG);
        let args = RunArgs {
            attested: true,
            ..Default::default()
        };

        let (config, workflow) = command(temp.path(), args).prepare().unwrap();

        assert_eq!(config.identity, IdentityMethod::Attested);
        assert_eq!(workflow.name(), "trade");
    }

    #[test]
    fn env_supplies_credentials() {
        let temp = setup_project("bank_guid: b\napi_url: https://bank.example.com\n");
        let env = HashMap::from([
            ("LEDGERFLOW_CLIENT_ID".to_string(), "env-id".to_string()),
            ("LEDGERFLOW_CLIENT_SECRET".to_string(), "env-secret".to_string()),
        ]);

        let (config, _) = RunCommand::new(temp.path(), None, RunArgs::default())
            .with_env(env)
            .prepare()
            .unwrap();

        assert_eq!(config.credentials().unwrap(), ("env-id", "env-secret"));
    }

    #[test]
    fn run_workflow_success_shows_report() {
        let config = FlowConfig::default();
        let client = Scripted::new(&["pending", "completed"]);
        let clock = ManualClock::new();
        let mut ui = MockUI::new();

        let result = run_workflow(
            &single_trade_workflow(Duration::from_secs(5)),
            &config,
            &client,
            &clock,
            &mut ui,
        );

        assert!(result.success);
        assert_eq!(ui.reports().len(), 1);
        assert!(ui.has_success("trade flow completed"));
        assert!(ui.has_spinner_result("success: buy_trade_btc"));
    }

    #[test]
    fn run_workflow_timeout_exits_zero() {
        let config = FlowConfig::default();
        let client = Scripted::new(&["pending"]);
        let clock = ManualClock::new();
        let mut ui = MockUI::new();

        let result = run_workflow(
            &single_trade_workflow(Duration::from_secs(3)),
            &config,
            &client,
            &clock,
            &mut ui,
        );

        assert!(!result.success);
        assert_eq!(result.exit_code, 0);
        assert!(ui.has_warning("TimeoutError"));
        assert!(ui.reports().is_empty());
    }

    #[test]
    fn run_workflow_wrong_terminal_state_exits_one() {
        let config = FlowConfig::default();
        let client = Scripted::new(&["pending", "failed"]);
        let clock = ManualClock::new();
        let mut ui = MockUI::new();

        let result = run_workflow(
            &single_trade_workflow(Duration::from_secs(5)),
            &config,
            &client,
            &clock,
            &mut ui,
        );

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("UnexpectedStateError"));
        assert!(ui.has_error("'failed'"));
    }
}
