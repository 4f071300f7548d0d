//! Configuration loading, parsing, and validation for ledgerflow.
//!
//! - Schema definitions in [`schema`]
//! - File discovery, environment overlay, and loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use ledgerflow::config::{load_config, validate};
//! use std::collections::HashMap;
//! use std::fs;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".ledgerflow");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(
//!     dir.join("config.yml"),
//!     "bank_guid: bank_1\napi_url: https://bank.example.com\n",
//! )
//! .unwrap();
//!
//! let env = HashMap::from([
//!     ("LEDGERFLOW_CLIENT_ID".to_string(), "id".to_string()),
//!     ("LEDGERFLOW_CLIENT_SECRET".to_string(), "secret".to_string()),
//! ]);
//! let config = load_config(temp.path(), None, &env).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.bank_guid.as_deref(), Some("bank_1"));
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{
    apply_env_overrides, default_config_path, load_config, load_config_file, parse_config,
};
pub use schema::{FlowConfig, IdentityMethod};
pub use validator::{validate, validate_config, ValidationError};
