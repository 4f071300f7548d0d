//! Builders for the canonical steps shared by every flow.
//!
//! Each builder returns a [`WorkflowStep`] whose create closure reads the
//! configuration and earlier outputs through the run context. Step names
//! are stable; later steps find earlier resources by them.

use serde_json::{json, Value};

use crate::config::{FlowConfig, IdentityMethod};
use crate::error::{LedgerflowError, Result};
use crate::money::{expect_balance, Asset};
use crate::resource::{ResourceKind, ResourceSnapshot};
use crate::workflow::{FlowContext, StepOutputs, WorkflowStep};

/// Account attribute holding the settled balance in subunits.
pub const BALANCE_ATTRIBUTE: &str = "platform_balance";

pub const VERIFICATION_KEY: &str = "verification_key";
pub const CUSTOMER: &str = "customer";
pub const IDENTITY: &str = "identity";
pub const FIAT_ACCOUNT: &str = "fiat_account";
pub const DEPOSIT_QUOTE: &str = "deposit_quote";
pub const DEPOSIT_TRANSFER: &str = "deposit_transfer";
pub const FIAT_BALANCE_AFTER_DEPOSIT: &str = "fiat_balance_after_deposit";
pub const WITHDRAWAL_QUOTE: &str = "withdrawal_quote";
pub const WITHDRAWAL_TRANSFER: &str = "withdrawal_transfer";
pub const FIAT_BALANCE_AFTER_WITHDRAWAL: &str = "fiat_balance_after_withdrawal";
pub const FIAT_BALANCE_AFTER_TRADES: &str = "fiat_balance_after_trades";

/// Name of a per-asset step, e.g. `buy_trade_btc`.
pub fn asset_step(prefix: &str, asset: Asset) -> String {
    format!("{}_{}", prefix, asset.code().to_lowercase())
}

pub fn trading_account_name(asset: Asset) -> String {
    asset_step("trading_account", asset)
}

pub fn external_wallet_name(asset: Asset) -> String {
    asset_step("external_wallet", asset)
}

pub fn buy_quote_name(asset: Asset) -> String {
    asset_step("buy_quote", asset)
}

pub fn buy_trade_name(asset: Asset) -> String {
    asset_step("buy_trade", asset)
}

pub fn trading_balance_name(asset: Asset) -> String {
    asset_step("trading_balance", asset)
}

/// Amounts go over the wire as JSON integers.
fn amount_value(subunits: i128) -> Result<Value> {
    i64::try_from(subunits)
        .map(Value::from)
        .map_err(|_| LedgerflowError::validation(format!("amount {} is out of range", subunits)))
}

/// Confirm a pre-provisioned verification key is ready.
///
/// Lists the bank's keys and takes a verified one, or failing that the
/// first key that has not failed, and waits for it.
pub fn verification_key(config: &FlowConfig) -> Result<WorkflowStep> {
    WorkflowStep::builder(VERIFICATION_KEY, ResourceKind::VerificationKey)
        .schedule(config.poll_schedule())
        .create(|ctx, _| pick_verification_key(ctx.client.list(ResourceKind::VerificationKey)?))
        .build()
}

fn pick_verification_key(keys: Vec<ResourceSnapshot>) -> Result<ResourceSnapshot> {
    let (verified, pending): (Vec<_>, Vec<_>) = keys
        .into_iter()
        .filter(|key| key.state() != "failed")
        .partition(|key| key.state() == "verified");

    verified
        .into_iter()
        .chain(pending)
        .next()
        .ok_or_else(|| LedgerflowError::validation("no usable verification key is provisioned"))
}

/// Create an individual customer under the configured bank.
pub fn customer(config: &FlowConfig) -> Result<WorkflowStep> {
    WorkflowStep::builder(CUSTOMER, ResourceKind::Customer)
        .schedule(config.poll_schedule())
        .create(|ctx, _| {
            let params = json!({
                "type": "individual",
                "bank_guid": ctx.config.bank_guid()?,
            });
            ctx.client.create(ResourceKind::Customer, &params)
        })
        .build()
}

/// Verify the customer's identity and require a passing outcome.
pub fn identity(config: &FlowConfig, method: IdentityMethod) -> Result<WorkflowStep> {
    WorkflowStep::builder(IDENTITY, ResourceKind::IdentityVerification)
        .schedule(config.poll_schedule())
        .create(move |ctx, outputs| {
            let params = json!({
                "type": "kyc",
                "method": method.api_name(),
                "customer_guid": outputs.id_of(CUSTOMER)?,
            });
            ctx.client.create(ResourceKind::IdentityVerification, &params)
        })
        .check(|_, _, verification| match verification.attr_str("outcome") {
            Some("passed") => Ok(()),
            Some(outcome) => Err(LedgerflowError::validation(format!(
                "{} completed with outcome '{}'",
                verification.label(),
                outcome
            ))),
            None => Err(LedgerflowError::validation(format!(
                "{} completed without an outcome",
                verification.label()
            ))),
        })
        .build()
}

/// Create the customer's fiat account.
pub fn fiat_account(config: &FlowConfig) -> Result<WorkflowStep> {
    account(config, FIAT_ACCOUNT.to_string(), "fiat", config.fiat()?)
}

/// Create the customer's trading account for `asset`.
pub fn trading_account(config: &FlowConfig, asset: Asset) -> Result<WorkflowStep> {
    account(config, trading_account_name(asset), "trading", asset)
}

fn account(
    config: &FlowConfig,
    name: String,
    account_type: &'static str,
    asset: Asset,
) -> Result<WorkflowStep> {
    let display_name = format!("{} {} account", asset, account_type);

    WorkflowStep::builder(name, ResourceKind::Account)
        .schedule(config.poll_schedule())
        .create(move |ctx, outputs| {
            let params = json!({
                "type": account_type,
                "asset": asset.code(),
                "customer_guid": outputs.id_of(CUSTOMER)?,
                "name": display_name,
            });
            ctx.client.create(ResourceKind::Account, &params)
        })
        .build()
}

/// Quote a fiat deposit of the configured amount.
pub fn deposit_quote(config: &FlowConfig) -> Result<WorkflowStep> {
    WorkflowStep::builder(DEPOSIT_QUOTE, ResourceKind::Quote)
        .schedule(config.poll_schedule())
        .create(|ctx, outputs| {
            let params = json!({
                "product_type": "funding",
                "customer_guid": outputs.id_of(CUSTOMER)?,
                "asset": ctx.config.fiat()?.code(),
                "side": "deposit",
                "receive_amount": amount_value(ctx.config.deposit_subunits()?)?,
            });
            ctx.client.create(ResourceKind::Quote, &params)
        })
        .build()
}

/// Quote a fiat withdrawal of the configured amount.
pub fn withdrawal_quote(config: &FlowConfig) -> Result<WorkflowStep> {
    WorkflowStep::builder(WITHDRAWAL_QUOTE, ResourceKind::Quote)
        .schedule(config.poll_schedule())
        .create(|ctx, outputs| {
            let params = json!({
                "product_type": "funding",
                "customer_guid": outputs.id_of(CUSTOMER)?,
                "asset": ctx.config.fiat()?.code(),
                "side": "withdrawal",
                "deliver_amount": amount_value(ctx.config.withdrawal_subunits()?)?,
            });
            ctx.client.create(ResourceKind::Quote, &params)
        })
        .build()
}

/// Execute the funding transfer for the quote produced by `quote_step`.
pub fn funding_transfer(
    config: &FlowConfig,
    name: &str,
    quote_step: &'static str,
) -> Result<WorkflowStep> {
    WorkflowStep::builder(name, ResourceKind::Transfer)
        .schedule(config.poll_schedule())
        .create(move |ctx, outputs| {
            let params = json!({
                "quote_guid": outputs.id_of(quote_step)?,
                "transfer_type": "funding",
            });
            ctx.client.create(ResourceKind::Transfer, &params)
        })
        .build()
}

/// Register an external wallet for `asset` at the configured address.
///
/// # Errors
///
/// Returns a configuration error if no address is configured for `asset`.
pub fn external_wallet(config: &FlowConfig, asset: Asset) -> Result<WorkflowStep> {
    let address = config.wallet_address(asset)?.to_string();
    let display_name = format!("{} wallet", asset);

    WorkflowStep::builder(external_wallet_name(asset), ResourceKind::ExternalWallet)
        .schedule(config.poll_schedule())
        .create(move |ctx, outputs| {
            let params = json!({
                "name": display_name,
                "asset": asset.code(),
                "address": address,
                "customer_guid": outputs.id_of(CUSTOMER)?,
            });
            ctx.client.create(ResourceKind::ExternalWallet, &params)
        })
        .build()
}

/// Quote buying `asset` with the configured fiat amount.
pub fn buy_quote(config: &FlowConfig, asset: Asset) -> Result<WorkflowStep> {
    WorkflowStep::builder(buy_quote_name(asset), ResourceKind::Quote)
        .schedule(config.poll_schedule())
        .create(move |ctx, outputs| {
            let fiat = ctx.config.fiat()?;
            let params = json!({
                "product_type": "trading",
                "customer_guid": outputs.id_of(CUSTOMER)?,
                "symbol": asset.symbol(fiat),
                "side": "buy",
                "deliver_amount": amount_value(ctx.config.trade_subunits()?)?,
            });
            ctx.client.create(ResourceKind::Quote, &params)
        })
        .build()
}

/// Execute the buy quoted for `asset`.
///
/// The settled trade must report what it received; the balance checks
/// depend on it.
pub fn buy_trade(config: &FlowConfig, asset: Asset) -> Result<WorkflowStep> {
    let quote_step = buy_quote_name(asset);

    WorkflowStep::builder(buy_trade_name(asset), ResourceKind::Trade)
        .schedule(config.poll_schedule())
        .create(move |ctx, outputs| {
            let params = json!({ "quote_guid": outputs.id_of(&quote_step)? });
            ctx.client.create(ResourceKind::Trade, &params)
        })
        .check(|_, _, trade| {
            trade.attr_amount("receive_amount")?;
            trade.attr_amount("deliver_amount")?;
            Ok(())
        })
        .build()
}

/// Re-fetch the fiat account and require exactly the deposited amount.
pub fn fiat_balance_after_deposit(config: &FlowConfig) -> Result<WorkflowStep> {
    balance(
        config,
        FIAT_BALANCE_AFTER_DEPOSIT.to_string(),
        FIAT_ACCOUNT.to_string(),
        config.fiat()?,
        |ctx, _| ctx.config.deposit_subunits(),
    )
}

/// Re-fetch the fiat account and require the post-deposit balance less the
/// withdrawal.
pub fn fiat_balance_after_withdrawal(config: &FlowConfig) -> Result<WorkflowStep> {
    balance(
        config,
        FIAT_BALANCE_AFTER_WITHDRAWAL.to_string(),
        FIAT_ACCOUNT.to_string(),
        config.fiat()?,
        |ctx, outputs| {
            let previous = previous_balance(outputs, FIAT_BALANCE_AFTER_DEPOSIT)?;
            Ok(previous - ctx.config.withdrawal_subunits()?)
        },
    )
}

/// Re-fetch the fiat account and require the post-deposit balance less
/// what every buy delivered, fees included.
pub fn fiat_balance_after_trades(config: &FlowConfig, assets: &[Asset]) -> Result<WorkflowStep> {
    let trade_steps: Vec<String> = assets.iter().copied().map(buy_trade_name).collect();

    balance(
        config,
        FIAT_BALANCE_AFTER_TRADES.to_string(),
        FIAT_ACCOUNT.to_string(),
        config.fiat()?,
        move |_, outputs| {
            let mut expected = previous_balance(outputs, FIAT_BALANCE_AFTER_DEPOSIT)?;
            for step in &trade_steps {
                let trade = outputs.require(step)?;
                expected -= trade.attr_amount("deliver_amount")?;
                if trade.attr("fee").is_some() {
                    expected -= trade.attr_amount("fee")?;
                }
            }
            Ok(expected)
        },
    )
}

/// Re-fetch the trading account for `asset` and require exactly what the
/// buy received.
pub fn trading_balance(config: &FlowConfig, asset: Asset) -> Result<WorkflowStep> {
    let trade_step = buy_trade_name(asset);

    balance(
        config,
        trading_balance_name(asset),
        trading_account_name(asset),
        asset,
        move |_, outputs| outputs.require(&trade_step)?.attr_amount("receive_amount"),
    )
}

fn previous_balance(outputs: &StepOutputs, step: &str) -> Result<i128> {
    outputs.require(step)?.attr_amount(BALANCE_ATTRIBUTE)
}

/// A step that re-fetches an earlier account and checks its balance.
///
/// The check runs before the new snapshot is recorded, so `expected` still
/// sees the account as the earlier steps left it.
fn balance<F>(
    config: &FlowConfig,
    name: String,
    account_step: String,
    asset: Asset,
    expected: F,
) -> Result<WorkflowStep>
where
    F: Fn(&FlowContext<'_>, &StepOutputs) -> Result<i128> + 'static,
{
    WorkflowStep::builder(name, ResourceKind::Account)
        .schedule(config.poll_schedule())
        .create(move |ctx, outputs| {
            ctx.client
                .get(ResourceKind::Account, outputs.id_of(&account_step)?)
        })
        .check(move |ctx, outputs, account| {
            let actual = account.attr_amount(BALANCE_ATTRIBUTE)?;
            expect_balance(&account.label(), asset, actual, expected(ctx, outputs)?)
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResourceClient;
    use crate::error::ErrorKind;
    use crate::poll::ManualClock;
    use std::cell::RefCell;

    /// Records create parameters and answers every call with a settled resource.
    #[derive(Default)]
    struct RecordingLedger {
        created: RefCell<Vec<(ResourceKind, Value)>>,
        accounts: RefCell<Vec<ResourceSnapshot>>,
        keys: Vec<ResourceSnapshot>,
    }

    impl ResourceClient for RecordingLedger {
        fn create(&self, kind: ResourceKind, parameters: &Value) -> Result<ResourceSnapshot> {
            self.created.borrow_mut().push((kind, parameters.clone()));
            Ok(ResourceSnapshot::new(kind, "new_1", kind.success_state()))
        }

        fn get(&self, kind: ResourceKind, id: &str) -> Result<ResourceSnapshot> {
            self.accounts
                .borrow()
                .iter()
                .find(|a| a.id() == id)
                .cloned()
                .ok_or_else(|| LedgerflowError::transport(format!("{} {} not found", kind, id)))
        }

        fn list(&self, _: ResourceKind) -> Result<Vec<ResourceSnapshot>> {
            Ok(self.keys.clone())
        }
    }

    fn config() -> FlowConfig {
        FlowConfig {
            bank_guid: Some("bank_1".into()),
            ..Default::default()
        }
    }

    fn with_customer() -> StepOutputs {
        let mut outputs = StepOutputs::new();
        outputs.insert(CUSTOMER, ResourceSnapshot::new(ResourceKind::Customer, "cus_1", "unverified"));
        outputs
    }

    fn btc() -> Asset {
        Asset::parse("BTC").unwrap()
    }

    #[test]
    fn verification_key_prefers_verified() {
        let keys = vec![
            ResourceSnapshot::new(ResourceKind::VerificationKey, "vk_failed", "failed"),
            ResourceSnapshot::new(ResourceKind::VerificationKey, "vk_pending", "pending"),
            ResourceSnapshot::new(ResourceKind::VerificationKey, "vk_ready", "verified"),
        ];
        assert_eq!(pick_verification_key(keys).unwrap().id(), "vk_ready");
    }

    #[test]
    fn verification_key_falls_back_to_pending() {
        let keys = vec![
            ResourceSnapshot::new(ResourceKind::VerificationKey, "vk_failed", "failed"),
            ResourceSnapshot::new(ResourceKind::VerificationKey, "vk_pending", "pending"),
        ];
        assert_eq!(pick_verification_key(keys).unwrap().id(), "vk_pending");
    }

    #[test]
    fn missing_verification_key_is_validation_error() {
        let keys = vec![ResourceSnapshot::new(ResourceKind::VerificationKey, "vk", "failed")];
        let err = pick_verification_key(keys).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn customer_is_created_under_bank() {
        let config = config();
        let clock = ManualClock::new();
        let ledger = RecordingLedger::default();
        let ctx = FlowContext::new(&config, &ledger, &clock);

        customer(&config).unwrap().create(&ctx, &StepOutputs::new()).unwrap();

        let created = ledger.created.borrow();
        assert_eq!(created[0].0, ResourceKind::Customer);
        assert_eq!(created[0].1["bank_guid"], "bank_1");
        assert_eq!(created[0].1["type"], "individual");
    }

    #[test]
    fn identity_uses_method_and_customer() {
        let config = config();
        let clock = ManualClock::new();
        let ledger = RecordingLedger::default();
        let ctx = FlowContext::new(&config, &ledger, &clock);

        identity(&config, IdentityMethod::Attested)
            .unwrap()
            .create(&ctx, &with_customer())
            .unwrap();

        let created = ledger.created.borrow();
        assert_eq!(created[0].1["method"], "attested");
        assert_eq!(created[0].1["customer_guid"], "cus_1");
    }

    #[test]
    fn identity_check_requires_passing_outcome() {
        let config = config();
        let clock = ManualClock::new();
        let ledger = RecordingLedger::default();
        let ctx = FlowContext::new(&config, &ledger, &clock);
        let step = identity(&config, IdentityMethod::Plain).unwrap();
        let outputs = StepOutputs::new();

        let passed = ResourceSnapshot::new(ResourceKind::IdentityVerification, "iv", "completed")
            .with_attribute("outcome", "passed");
        assert!(step.check(&ctx, &outputs, &passed).is_ok());

        let failed = ResourceSnapshot::new(ResourceKind::IdentityVerification, "iv", "completed")
            .with_attribute("outcome", "failed");
        let err = step.check(&ctx, &outputs, &failed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn deposit_quote_sends_subunits() {
        let config = config();
        let clock = ManualClock::new();
        let ledger = RecordingLedger::default();
        let ctx = FlowContext::new(&config, &ledger, &clock);

        deposit_quote(&config).unwrap().create(&ctx, &with_customer()).unwrap();

        let created = ledger.created.borrow();
        let params = &created[0].1;
        assert_eq!(params["side"], "deposit");
        assert_eq!(params["asset"], "USD");
        assert_eq!(params["receive_amount"], 100_000);
    }

    #[test]
    fn buy_quote_uses_symbol() {
        let config = config();
        let clock = ManualClock::new();
        let ledger = RecordingLedger::default();
        let ctx = FlowContext::new(&config, &ledger, &clock);

        buy_quote(&config, btc()).unwrap().create(&ctx, &with_customer()).unwrap();

        let created = ledger.created.borrow();
        assert_eq!(created[0].1["symbol"], "BTC-USD");
        assert_eq!(created[0].1["deliver_amount"], 10_000);
    }

    #[test]
    fn external_wallet_requires_address() {
        let err = external_wallet(&config(), btc()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn withdrawal_balance_is_previous_minus_withdrawal() {
        let config = config();
        let clock = ManualClock::new();
        let ledger = RecordingLedger::default();
        ledger.accounts.borrow_mut().push(
            ResourceSnapshot::new(ResourceKind::Account, "acc_1", "created")
                .with_attribute(BALANCE_ATTRIBUTE, 60_000),
        );
        let ctx = FlowContext::new(&config, &ledger, &clock);

        let mut outputs = with_customer();
        outputs.insert(
            FIAT_ACCOUNT,
            ResourceSnapshot::new(ResourceKind::Account, "acc_1", "created"),
        );
        outputs.insert(
            FIAT_BALANCE_AFTER_DEPOSIT,
            ResourceSnapshot::new(ResourceKind::Account, "acc_1", "created")
                .with_attribute(BALANCE_ATTRIBUTE, 100_000),
        );

        let step = fiat_balance_after_withdrawal(&config).unwrap();
        let account = step.create(&ctx, &outputs).unwrap();

        assert!(step.check(&ctx, &outputs, &account).is_ok());
    }

    #[test]
    fn trade_balance_mismatch_is_validation_error() {
        let config = config();
        let clock = ManualClock::new();
        let ledger = RecordingLedger::default();
        let ctx = FlowContext::new(&config, &ledger, &clock);

        let mut outputs = with_customer();
        outputs.insert(
            &buy_trade_name(btc()),
            ResourceSnapshot::new(ResourceKind::Trade, "trd_1", "completed")
                .with_attribute("receive_amount", 250_000)
                .with_attribute("deliver_amount", 10_000),
        );
        let account = ResourceSnapshot::new(ResourceKind::Account, "acc_btc", "created")
            .with_attribute(BALANCE_ATTRIBUTE, 249_999);

        let err = trading_balance(&config, btc())
            .unwrap()
            .check(&ctx, &outputs, &account)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("off by -1"));
    }

    #[test]
    fn asset_step_names_are_lowercase() {
        assert_eq!(buy_trade_name(btc()), "buy_trade_btc");
        assert_eq!(trading_account_name(btc()), "trading_account_btc");
    }
}
