//! The workflow variants.
//!
//! Every flow has the same opening: confirm the verification key, create
//! the customer, verify identity, open and fund a fiat account, and check
//! the deposit landed. They differ in what follows:
//!
//! - `trade` - buy the first configured asset and check both balances
//! - `transfer` - withdraw part of the deposit and check the remainder
//! - `multi-asset` - for each asset, open an account, register an external
//!   wallet, and buy; then check every balance

pub mod steps;

use std::fmt;
use std::str::FromStr;

use crate::config::FlowConfig;
use crate::error::Result;
use crate::money::Asset;
use crate::workflow::{Workflow, WorkflowStep};

use steps::*;

/// A named workflow variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    Trade,
    Transfer,
    MultiAsset,
}

impl FlowKind {
    /// Every variant, in display order.
    pub const ALL: [FlowKind; 3] = [FlowKind::Trade, FlowKind::Transfer, FlowKind::MultiAsset];

    /// Name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Trade => "trade",
            FlowKind::Transfer => "transfer",
            FlowKind::MultiAsset => "multi-asset",
        }
    }

    /// One-line summary.
    pub fn description(&self) -> &'static str {
        match self {
            FlowKind::Trade => "Fund a fiat account and buy one asset",
            FlowKind::Transfer => "Deposit fiat, withdraw part of it, and check the remainder",
            FlowKind::MultiAsset => "Fund a fiat account and buy every configured asset",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "trade" => Ok(FlowKind::Trade),
            "transfer" => Ok(FlowKind::Transfer),
            "multi-asset" | "multiasset" => Ok(FlowKind::MultiAsset),
            _ => Err(format!(
                "unknown flow '{}' (expected trade, transfer, or multi-asset)",
                s
            )),
        }
    }
}

/// Assets a flow trades, in order.
fn traded_assets(kind: FlowKind, config: &FlowConfig) -> Result<Vec<Asset>> {
    let assets = config.crypto_assets()?;
    Ok(match kind {
        FlowKind::Trade => assets.into_iter().take(1).collect(),
        FlowKind::Transfer => Vec::new(),
        FlowKind::MultiAsset => assets,
    })
}

/// Step names of a flow, without building it.
pub fn plan(kind: FlowKind, config: &FlowConfig) -> Result<Vec<String>> {
    let assets = traded_assets(kind, config)?;
    let mut names: Vec<String> = [VERIFICATION_KEY, CUSTOMER, IDENTITY, FIAT_ACCOUNT]
        .iter()
        .map(|s| s.to_string())
        .collect();

    if kind == FlowKind::Trade {
        names.extend(assets.iter().copied().map(trading_account_name));
    }

    names.extend(
        [DEPOSIT_QUOTE, DEPOSIT_TRANSFER, FIAT_BALANCE_AFTER_DEPOSIT]
            .iter()
            .map(|s| s.to_string()),
    );

    match kind {
        FlowKind::Transfer => names.extend(
            [
                WITHDRAWAL_QUOTE,
                WITHDRAWAL_TRANSFER,
                FIAT_BALANCE_AFTER_WITHDRAWAL,
            ]
            .iter()
            .map(|s| s.to_string()),
        ),
        FlowKind::Trade | FlowKind::MultiAsset => {
            for asset in &assets {
                if kind == FlowKind::MultiAsset {
                    names.push(trading_account_name(*asset));
                    names.push(external_wallet_name(*asset));
                }
                names.push(buy_quote_name(*asset));
                names.push(buy_trade_name(*asset));
                names.push(trading_balance_name(*asset));
            }
            names.push(FIAT_BALANCE_AFTER_TRADES.to_string());
        }
    }

    Ok(names)
}

/// Build a flow from the configuration.
///
/// The identity method comes from `config.identity`.
///
/// # Errors
///
/// Returns a configuration error if an asset is unknown, an external
/// wallet has no configured address, or a step violates its invariants.
pub fn build(kind: FlowKind, config: &FlowConfig) -> Result<Workflow> {
    let assets = traded_assets(kind, config)?;

    let mut steps: Vec<WorkflowStep> = vec![
        verification_key(config)?,
        customer(config)?,
        identity(config, config.identity)?,
        fiat_account(config)?,
    ];

    if kind == FlowKind::Trade {
        for asset in &assets {
            steps.push(trading_account(config, *asset)?);
        }
    }

    steps.push(deposit_quote(config)?);
    steps.push(funding_transfer(config, DEPOSIT_TRANSFER, DEPOSIT_QUOTE)?);
    steps.push(fiat_balance_after_deposit(config)?);

    match kind {
        FlowKind::Transfer => {
            steps.push(withdrawal_quote(config)?);
            steps.push(funding_transfer(config, WITHDRAWAL_TRANSFER, WITHDRAWAL_QUOTE)?);
            steps.push(fiat_balance_after_withdrawal(config)?);
        }
        FlowKind::Trade | FlowKind::MultiAsset => {
            for asset in &assets {
                if kind == FlowKind::MultiAsset {
                    steps.push(trading_account(config, *asset)?);
                    steps.push(external_wallet(config, *asset)?);
                }
                steps.push(buy_quote(config, *asset)?);
                steps.push(buy_trade(config, *asset)?);
                steps.push(trading_balance(config, *asset)?);
            }
            steps.push(fiat_balance_after_trades(config, &assets)?);
        }
    }

    Workflow::new(kind.as_str(), steps)
}
