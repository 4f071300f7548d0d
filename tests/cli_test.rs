//! Integration tests for the ledgerflow binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

const ENV_VARS: [&str; 5] = [
    "LEDGERFLOW_API_URL",
    "LEDGERFLOW_AUTH_URL",
    "LEDGERFLOW_BANK_GUID",
    "LEDGERFLOW_CLIENT_ID",
    "LEDGERFLOW_CLIENT_SECRET",
];

fn setup_project(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join(".ledgerflow");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.yml"), config).unwrap();
    temp
}

fn server_config(server: &MockServer) -> String {
    format!(
        r#"
bank_guid: bank_1
api_url: {}
client_id: id
client_secret: secret
step_timeout: 1
poll_interval: 1
"#,
        server.base_url()
    )
}

fn ledgerflow(dir: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("ledgerflow"));
    cmd.current_dir(dir.path()).arg("--no-color");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Mocks the opening of the transfer flow up to the deposit transfer, with
/// every resource already settled.
fn mock_opening(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/oauth/token");
        then.status(200)
            .json_body(json!({ "access_token": "tok_1", "token_type": "bearer" }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/verification_keys");
        then.status(200).json_body(json!({
            "objects": [{ "guid": "vk_1", "state": "verified" }]
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/customers");
        then.status(201)
            .json_body(json!({ "guid": "cus_1", "state": "unverified" }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/identity_verifications");
        then.status(201).json_body(json!({
            "guid": "iv_1", "state": "completed", "outcome": "passed"
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/accounts");
        then.status(201).json_body(json!({
            "guid": "acc_1", "state": "created", "type": "fiat", "platform_balance": "0"
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/quotes");
        then.status(201).json_body(json!({
            "guid": "q_1", "state": "created", "receive_amount": 100000
        }));
    });
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("ledgerflow"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Drive ledger workflows"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("ledgerflow"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_flows_lists_every_flow() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    ledgerflow(&temp)
        .arg("flows")
        .assert()
        .success()
        .stdout(predicate::str::contains("multi-asset"))
        .stdout(predicate::str::contains("withdrawal_transfer"))
        .stdout(predicate::str::contains("buy_trade_btc"));
    Ok(())
}

#[test]
fn cli_run_no_config_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    ledgerflow(&temp)
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ConfigurationError"));
    Ok(())
}

#[test]
fn cli_no_args_runs_trade_flow() -> Result<(), Box<dyn std::error::Error>> {
    // Without a subcommand the trade flow runs, and fails the same way.
    let temp = TempDir::new()?;
    ledgerflow(&temp)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration not found"));
    Ok(())
}

#[test]
fn cli_run_unknown_flow_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("bank_guid: b\napi_url: https://x.example.com\nclient_id: i\nclient_secret: s\n");
    ledgerflow(&temp)
        .args(["run", "--flow", "refund"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown flow 'refund'"));
    Ok(())
}

#[test]
fn cli_run_missing_credentials_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("bank_guid: b\napi_url: https://x.example.com\n");
    ledgerflow(&temp)
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("client_id"));
    Ok(())
}

#[test]
fn cli_run_credentials_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start();
    let token = server.mock(|when, then| {
        when.method(POST)
            .path("/oauth/token")
            .body_includes("env-id");
        then.status(401).body("invalid_client");
    });
    let temp = setup_project(&format!("bank_guid: b\napi_url: {}\n", server.base_url()));

    ledgerflow(&temp)
        .env("LEDGERFLOW_CLIENT_ID", "env-id")
        .env("LEDGERFLOW_CLIENT_SECRET", "env-secret")
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TransportError"))
        .stderr(predicate::str::contains("401"));
    token.assert();
    Ok(())
}

#[test]
fn cli_run_balance_mismatch_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start();
    mock_opening(&server);
    server.mock(|when, then| {
        when.method(POST).path("/api/transfers");
        then.status(201)
            .json_body(json!({ "guid": "tr_1", "state": "completed" }));
    });
    let balance = server.mock(|when, then| {
        when.method(GET).path("/api/accounts/acc_1");
        then.status(200).json_body(json!({
            "guid": "acc_1", "state": "created", "platform_balance": "99999"
        }));
    });
    let temp = setup_project(&server_config(&server));

    ledgerflow(&temp)
        .args(["run", "--flow", "transfer"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ValidationError"))
        .stderr(predicate::str::contains("off by -1 subunits"));
    balance.assert();
    Ok(())
}

#[test]
fn cli_run_timeout_exits_zero() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start();
    mock_opening(&server);
    server.mock(|when, then| {
        when.method(POST).path("/api/transfers");
        then.status(201)
            .json_body(json!({ "guid": "tr_1", "state": "pending" }));
    });
    let poll = server.mock(|when, then| {
        when.method(GET).path("/api/transfers/tr_1");
        then.status(200)
            .json_body(json!({ "guid": "tr_1", "state": "pending" }));
    });
    let temp = setup_project(&server_config(&server));

    ledgerflow(&temp)
        .args(["run", "--flow", "transfer"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("TimeoutError"))
        .stdout(predicate::str::contains("deposit_transfer"));
    assert!(poll.hits() >= 1);
    Ok(())
}
