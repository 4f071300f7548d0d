//! Configuration file discovery and loading.
//!
//! Configuration is read once at startup from `.ledgerflow/config.yml`
//! (or an explicit `--config` path), overlaid with `LEDGERFLOW_*`
//! environment variables, and validated before any step runs.

use crate::config::schema::FlowConfig;
use crate::config::validator::validate;
use crate::error::{LedgerflowError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding project configuration.
pub const CONFIG_DIR: &str = ".ledgerflow";

/// Configuration file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.yml";

/// Environment variables that override file values.
pub const ENV_API_URL: &str = "LEDGERFLOW_API_URL";
pub const ENV_AUTH_URL: &str = "LEDGERFLOW_AUTH_URL";
pub const ENV_BANK_GUID: &str = "LEDGERFLOW_BANK_GUID";
pub const ENV_CLIENT_ID: &str = "LEDGERFLOW_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "LEDGERFLOW_CLIENT_SECRET";

/// Default config location for a project root.
pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load a single config file and parse it into FlowConfig.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<FlowConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LedgerflowError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LedgerflowError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into FlowConfig.
///
/// An empty document yields the defaults.
pub fn parse_config(content: &str, source_path: &Path) -> Result<FlowConfig> {
    if content.trim().is_empty() {
        return Ok(FlowConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| LedgerflowError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Overlay `LEDGERFLOW_*` variables onto a loaded config.
///
/// Empty variables are ignored.
pub fn apply_env_overrides(config: &mut FlowConfig, env: &HashMap<String, String>) {
    let lookup = |key: &str| {
        env.get(key)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    };

    if let Some(value) = lookup(ENV_API_URL) {
        config.api_url = Some(value);
    }
    if let Some(value) = lookup(ENV_AUTH_URL) {
        config.auth_url = Some(value);
    }
    if let Some(value) = lookup(ENV_BANK_GUID) {
        config.bank_guid = Some(value);
    }
    if let Some(value) = lookup(ENV_CLIENT_ID) {
        config.client_id = Some(value);
    }
    if let Some(value) = lookup(ENV_CLIENT_SECRET) {
        config.client_secret = Some(value);
    }
}

/// Load, overlay, and validate the configuration for a run.
///
/// Uses `explicit` when given, otherwise the project's default path.
///
/// # Errors
///
/// Returns `ConfigNotFound`, `ConfigParseError`, or `ConfigValidationError`.
pub fn load_config(
    project_root: &Path,
    explicit: Option<&Path>,
    env: &HashMap<String, String>,
) -> Result<FlowConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_config_path(project_root));

    let mut config = load_config_file(&path)?;
    apply_env_overrides(&mut config, env);
    validate(&config)?;

    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}
