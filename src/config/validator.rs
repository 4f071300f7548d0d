//! Configuration validation rules.
//!
//! This module validates configuration before a run starts:
//! - Connection settings and credentials must be present
//! - Timeouts and the poll interval must be positive
//! - Every asset must be known, and amounts must parse in that asset
//! - A withdrawal may not exceed the deposit it draws from

use crate::config::schema::FlowConfig;
use crate::error::{LedgerflowError, Result};
use crate::money::Asset;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// This function collects all validation errors rather than stopping
/// at the first one, allowing users to fix multiple issues at once.
pub fn validate_config(config: &FlowConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_connection(config));
    errors.extend(validate_timing(config));
    errors.extend(validate_assets(config));

    errors
}

fn validate_connection(config: &FlowConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());

    for (key, value) in [
        ("bank_guid", &config.bank_guid),
        ("api_url", &config.api_url),
        ("client_id", &config.client_id),
        ("client_secret", &config.client_secret),
    ] {
        if !present(value) {
            errors.push(ValidationError::new(
                "missing-field",
                format!("'{}' is required", key),
            ));
        }
    }

    for (key, value) in [("api_url", &config.api_url), ("auth_url", &config.auth_url)] {
        if let Some(url) = value {
            if present(value) && !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(ValidationError::new(
                    "invalid-url",
                    format!("'{}' must be an http(s) URL, got '{}'", key, url),
                ));
            }
        }
    }

    errors
}

fn validate_timing(config: &FlowConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (key, value) in [
        ("request_timeout", config.request_timeout),
        ("poll_interval", config.poll_interval),
        ("step_timeout", config.step_timeout),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(
                "non-positive-duration",
                format!("'{}' must be at least 1 second", key),
            ));
        }
    }

    errors
}

fn validate_assets(config: &FlowConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.assets.is_empty() {
        errors.push(ValidationError::new(
            "no-assets",
            "'assets' must list at least one asset",
        ));
    }

    for code in &config.assets {
        if Asset::lookup(code).is_none() {
            errors.push(ValidationError::new(
                "unknown-asset",
                format!("unknown asset '{}' in 'assets'", code),
            ));
        }
    }

    let Some(fiat) = Asset::lookup(&config.fiat_asset) else {
        errors.push(ValidationError::new(
            "unknown-asset",
            format!("unknown fiat_asset '{}'", config.fiat_asset),
        ));
        return errors;
    };

    let mut amount = |key: &str, value: &str| match fiat.to_subunits(value) {
        Ok(0) => {
            errors.push(ValidationError::new(
                "invalid-amount",
                format!("'{}' must be greater than zero", key),
            ));
            None
        }
        Ok(subunits) => Some(subunits),
        Err(e) => {
            errors.push(ValidationError::new(
                "invalid-amount",
                format!("'{}': {}", key, e),
            ));
            None
        }
    };

    let deposit = amount("deposit_amount", &config.deposit_amount);
    let withdrawal = amount("withdrawal_amount", &config.withdrawal_amount);
    let trade = amount("trade_amount", &config.trade_amount);

    if let (Some(deposit), Some(withdrawal)) = (deposit, withdrawal) {
        if withdrawal > deposit {
            errors.push(ValidationError::new(
                "withdrawal-exceeds-deposit",
                format!(
                    "withdrawal_amount {} exceeds deposit_amount {}",
                    fiat.format(withdrawal),
                    fiat.format(deposit)
                ),
            ));
        }
    }

    if let (Some(deposit), Some(trade)) = (deposit, trade) {
        if trade.saturating_mul(config.assets.len() as i128) > deposit {
            errors.push(ValidationError::new(
                "trades-exceed-deposit",
                format!(
                    "{} buys of {} exceed deposit_amount {}",
                    config.assets.len(),
                    fiat.format(trade),
                    fiat.format(deposit)
                ),
            ));
        }
    }

    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &FlowConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(LedgerflowError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
