//! Asset amounts in integer subunits.
//!
//! Amounts cross the ledger boundary as integers in the asset's smallest
//! unit (cents, satoshi, wei). Human-entered decimal strings are converted
//! exactly with `rust_decimal`; nothing here touches floating point.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{LedgerflowError, Result};

/// An asset and the number of decimal places in its subunit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    code: &'static str,
    decimals: u32,
}

const KNOWN_ASSETS: &[Asset] = &[
    Asset { code: "USD", decimals: 2 },
    Asset { code: "CAD", decimals: 2 },
    Asset { code: "EUR", decimals: 2 },
    Asset { code: "BTC", decimals: 8 },
    Asset { code: "ETH", decimals: 18 },
    Asset { code: "USDC", decimals: 6 },
    Asset { code: "SOL", decimals: 9 },
];

impl Asset {
    /// Find a known asset by code (case-insensitive).
    pub fn lookup(code: &str) -> Option<Asset> {
        KNOWN_ASSETS
            .iter()
            .copied()
            .find(|asset| asset.code.eq_ignore_ascii_case(code.trim()))
    }

    /// Like [`Asset::lookup`], but an unknown code is a configuration error.
    pub fn parse(code: &str) -> Result<Asset> {
        Self::lookup(code).ok_or_else(|| LedgerflowError::config(format!("unknown asset '{}'", code)))
    }

    /// All assets this build knows about.
    pub fn known() -> &'static [Asset] {
        KNOWN_ASSETS
    }

    /// Upper-case asset code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Decimal places between the unit and the subunit.
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Trading symbol against a fiat asset, e.g. `BTC-USD`.
    pub fn symbol(&self, fiat: Asset) -> String {
        format!("{}-{}", self.code, fiat.code)
    }

    /// Convert a decimal string in whole units to subunits.
    ///
    /// `"1000.00"` USD is `100000`. More fractional digits than the asset
    /// has, or a negative amount, is rejected.
    pub fn to_subunits(&self, amount: &str) -> Result<i128> {
        let mut value = Decimal::from_str(amount.trim()).map_err(|e| {
            LedgerflowError::config(format!("invalid {} amount '{}': {}", self.code, amount, e))
        })?;

        if value.is_sign_negative() {
            return Err(LedgerflowError::config(format!(
                "{} amount '{}' is negative",
                self.code, amount
            )));
        }

        if value.scale() > self.decimals {
            return Err(LedgerflowError::config(format!(
                "{} amount '{}' has more than {} decimal places",
                self.code, amount, self.decimals
            )));
        }

        value.rescale(self.decimals);
        if value.scale() != self.decimals {
            return Err(LedgerflowError::config(format!(
                "{} amount '{}' is out of range",
                self.code, amount
            )));
        }

        Ok(value.mantissa())
    }

    /// Render subunits as a decimal string with the asset code.
    pub fn format(&self, subunits: i128) -> String {
        match Decimal::try_from_i128_with_scale(subunits, self.decimals) {
            Ok(value) => format!("{} {}", value, self.code),
            Err(_) => format!("{} {} subunits", subunits, self.code),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

/// Fail with a validation error unless `actual == expected`, exactly.
pub fn expect_balance(label: &str, asset: Asset, actual: i128, expected: i128) -> Result<()> {
    if actual == expected {
        return Ok(());
    }
    Err(LedgerflowError::validation(format!(
        "{} balance is {}, expected {} (off by {} subunits)",
        label,
        asset.format(actual),
        asset.format(expected),
        actual - expected
    )))
}
