//! Flows command implementation.
//!
//! The `ledgerflow flows` command lists the workflows and their steps.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cli::args::FlowsArgs;
use crate::config::{apply_env_overrides, default_config_path, load_config_file, FlowConfig};
use crate::error::{LedgerflowError, Result};
use crate::flows::{self, FlowKind};
use crate::ui::{LedgerflowTheme, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The flows command implementation.
pub struct FlowsCommand {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    args: FlowsArgs,
}

impl FlowsCommand {
    /// Create a new flows command.
    pub fn new(project_root: &Path, config_path: Option<&Path>, args: FlowsArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }

    /// Configuration used to name per-asset steps.
    ///
    /// Credentials are not needed to list steps, so the file is not
    /// validated. A missing default file falls back to the defaults; a
    /// missing explicit file is an error.
    fn config(&self) -> Result<FlowConfig> {
        let mut config = match &self.config_path {
            Some(path) => load_config_file(path)?,
            None => match load_config_file(&default_config_path(&self.project_root)) {
                Ok(config) => config,
                Err(LedgerflowError::ConfigNotFound { .. }) => FlowConfig::default(),
                Err(e) => return Err(e),
            },
        };
        let env: HashMap<String, String> = std::env::vars().collect();
        apply_env_overrides(&mut config, &env);
        Ok(config)
    }

    fn kinds(&self) -> Result<Vec<FlowKind>> {
        match &self.args.flow {
            Some(name) => Ok(vec![name
                .parse::<FlowKind>()
                .map_err(LedgerflowError::config)?]),
            None => Ok(FlowKind::ALL.to_vec()),
        }
    }

    fn list(&self, ui: &mut dyn UserInterface) -> Result<()> {
        let config = self.config()?;
        let theme = LedgerflowTheme::new();

        ui.message(&format!("  {}", theme.header.apply_to("Flows:")));
        for kind in self.kinds()? {
            let steps = flows::plan(kind, &config)?;
            ui.message(&format!(
                "    {}{} {}",
                theme.highlight.apply_to(kind.as_str()),
                theme.dim.apply_to(":"),
                kind.description(),
            ));
            ui.message(&format!("      {}", theme.dim.apply_to(steps.join(" → "))));
        }
        Ok(())
    }
}

impl Command for FlowsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match self.list(ui) {
            Ok(()) => Ok(CommandResult::success()),
            Err(e) => Ok(CommandResult::from_error(&e, ui)),
        }
    }
}
