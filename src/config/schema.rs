//! Configuration schema definitions for ledgerflow.
//!
//! This module contains the struct that maps to the YAML configuration
//! file format, plus typed accessors the workflow builders use.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{LedgerflowError, Result};
use crate::money::Asset;
use crate::poll::PollSchedule;

/// Root configuration structure for `.ledgerflow/config.yml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Bank identifier sent when creating customers and accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_guid: Option<String>,

    /// Ledger API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Token endpoint base URL (defaults to `api_url`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    /// OAuth client id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// OAuth scopes requested for the run
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Fixed pause between re-fetches, in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Convergence deadline per step, in seconds
    #[serde(default = "default_step_timeout")]
    pub step_timeout: u64,

    /// Funding asset
    #[serde(default = "default_fiat_asset")]
    pub fiat_asset: String,

    /// Crypto assets to trade, in order
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,

    /// Fiat deposited by the funding step, in whole units
    #[serde(default = "default_deposit_amount")]
    pub deposit_amount: String,

    /// Fiat withdrawn by the transfer flow, in whole units
    #[serde(default = "default_withdrawal_amount")]
    pub withdrawal_amount: String,

    /// Fiat spent per buy in the trade flows, in whole units
    #[serde(default = "default_trade_amount")]
    pub trade_amount: String,

    /// How the customer's identity is verified
    #[serde(default)]
    pub identity: IdentityMethod,

    /// External wallet address per asset code (multi-asset flow)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub wallet_addresses: HashMap<String, String>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            bank_guid: None,
            api_url: None,
            auth_url: None,
            client_id: None,
            client_secret: None,
            scopes: default_scopes(),
            request_timeout: default_request_timeout(),
            poll_interval: default_poll_interval(),
            step_timeout: default_step_timeout(),
            fiat_asset: default_fiat_asset(),
            assets: default_assets(),
            deposit_amount: default_deposit_amount(),
            withdrawal_amount: default_withdrawal_amount(),
            trade_amount: default_trade_amount(),
            identity: IdentityMethod::default(),
            wallet_addresses: HashMap::new(),
        }
    }
}

fn default_scopes() -> Vec<String> {
    [
        "banks:read",
        "accounts:read",
        "accounts:execute",
        "customers:read",
        "customers:write",
        "customers:execute",
        "prices:read",
        "quotes:execute",
        "quotes:read",
        "trades:execute",
        "trades:read",
        "transfers:execute",
        "transfers:read",
        "external_wallets:read",
        "external_wallets:execute",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    1
}

fn default_step_timeout() -> u64 {
    30
}

fn default_fiat_asset() -> String {
    "USD".to_string()
}

fn default_assets() -> Vec<String> {
    vec!["BTC".to_string()]
}

fn default_deposit_amount() -> String {
    "1000.00".to_string()
}

fn default_withdrawal_amount() -> String {
    "400.00".to_string()
}

fn default_trade_amount() -> String {
    "100.00".to_string()
}

impl FlowConfig {
    /// Ledger API base URL.
    pub fn api_url(&self) -> Result<&str> {
        required(&self.api_url, "api_url")
    }

    /// Token endpoint base URL, falling back to the API URL.
    pub fn auth_url(&self) -> Result<&str> {
        match &self.auth_url {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => self.api_url(),
        }
    }

    /// Bank identifier.
    pub fn bank_guid(&self) -> Result<&str> {
        required(&self.bank_guid, "bank_guid")
    }

    /// OAuth client id and secret.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        Ok((
            required(&self.client_id, "client_id")?,
            required(&self.client_secret, "client_secret")?,
        ))
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Convergence timing shared by every step.
    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule::new(
            Duration::from_secs(self.step_timeout),
            Duration::from_secs(self.poll_interval),
        )
    }

    /// The funding asset.
    pub fn fiat(&self) -> Result<Asset> {
        Asset::parse(&self.fiat_asset)
    }

    /// The crypto assets, in configured order.
    pub fn crypto_assets(&self) -> Result<Vec<Asset>> {
        self.assets.iter().map(|code| Asset::parse(code)).collect()
    }

    /// Deposit amount in fiat subunits.
    pub fn deposit_subunits(&self) -> Result<i128> {
        self.fiat()?.to_subunits(&self.deposit_amount)
    }

    /// Withdrawal amount in fiat subunits.
    pub fn withdrawal_subunits(&self) -> Result<i128> {
        self.fiat()?.to_subunits(&self.withdrawal_amount)
    }

    /// Per-buy trade amount in fiat subunits.
    pub fn trade_subunits(&self) -> Result<i128> {
        self.fiat()?.to_subunits(&self.trade_amount)
    }

    /// External wallet address for an asset.
    pub fn wallet_address(&self, asset: Asset) -> Result<&str> {
        self.wallet_addresses
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(asset.code()))
            .map(|(_, address)| address.as_str())
            .ok_or_else(|| {
                LedgerflowError::config(format!("no wallet_addresses entry for {}", asset))
            })
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LedgerflowError::config(format!("'{}' is required", key))),
    }
}

/// Identity verification method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMethod {
    /// Document and selfie verification run by the ledger
    #[default]
    Plain,
    /// The bank attests it has verified the customer itself
    Attested,
}

impl IdentityMethod {
    /// Method name the ledger expects.
    pub fn api_name(&self) -> &'static str {
        match self {
            IdentityMethod::Plain => "id_and_selfie",
            IdentityMethod::Attested => "attested",
        }
    }
}

impl fmt::Display for IdentityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IdentityMethod::Plain => "plain",
            IdentityMethod::Attested => "attested",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for IdentityMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "attested" => Ok(Self::Attested),
            _ => Err(format!("unknown identity method: {}", s)),
        }
    }
}
