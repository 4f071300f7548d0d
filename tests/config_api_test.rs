//! Integration tests for config module public API.

use ledgerflow::config::{
    apply_env_overrides, default_config_path, load_config, validate, validate_config, FlowConfig,
    IdentityMethod,
};
use ledgerflow::error::ErrorKind;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn write_config(content: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    let path = default_config_path(temp.path());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    temp
}

#[test]
fn public_api_is_accessible() {
    let config = FlowConfig::default();
    assert_eq!(config.identity, IdentityMethod::Plain);
    assert!(default_config_path(std::path::Path::new("/p")).ends_with(".ledgerflow/config.yml"));
}

#[test]
fn full_config_workflow() {
    let temp = write_config(
        r#"
bank_guid: bank_1
api_url: https://bank.example.com
auth_url: https://id.example.com
client_id: id
client_secret: secret
fiat_asset: EUR
assets: [BTC, ETH]
deposit_amount: "250.50"
withdrawal_amount: "50"
trade_amount: "10.25"
identity: attested
wallet_addresses:
  BTC: tb1qexample
  ETH: "0xexample"
"#,
    );

    let config = load_config(temp.path(), None, &HashMap::new()).unwrap();

    assert_eq!(config.fiat().unwrap().code(), "EUR");
    assert_eq!(config.deposit_subunits().unwrap(), 25_050);
    assert_eq!(config.trade_subunits().unwrap(), 1_025);
    assert_eq!(config.auth_url().unwrap(), "https://id.example.com");
    assert_eq!(config.identity, IdentityMethod::Attested);
    assert_eq!(config.crypto_assets().unwrap().len(), 2);
}

#[test]
fn env_overrides_then_validate() {
    let mut config = FlowConfig::default();
    assert!(validate(&config).is_err());

    let env = HashMap::from([
        ("LEDGERFLOW_API_URL".to_string(), "https://bank.example.com".to_string()),
        ("LEDGERFLOW_BANK_GUID".to_string(), "bank_1".to_string()),
        ("LEDGERFLOW_CLIENT_ID".to_string(), "id".to_string()),
        ("LEDGERFLOW_CLIENT_SECRET".to_string(), "secret".to_string()),
    ]);
    apply_env_overrides(&mut config, &env);

    assert!(validate(&config).is_ok());
}

#[test]
fn validation_collects_every_problem() {
    let config = FlowConfig {
        poll_interval: 0,
        assets: vec!["DOGE".into()],
        ..Default::default()
    };

    let rules: Vec<_> = validate_config(&config).into_iter().map(|e| e.rule).collect();

    assert!(rules.iter().any(|r| r == "missing-field"));
    assert!(rules.iter().any(|r| r == "non-positive-duration"));
    assert!(rules.iter().any(|r| r == "unknown-asset"));
}

#[test]
fn load_errors_are_configuration_errors() {
    let temp = write_config("deposit_amount: [not, a, string]\n");
    let err = load_config(temp.path(), None, &HashMap::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let empty = TempDir::new().unwrap();
    let err = load_config(empty.path(), None, &HashMap::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.kind().exit_policy().exit_code(), 2);
}
