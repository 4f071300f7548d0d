//! Resource kinds and their state vocabularies.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of resource the remote ledger exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Customer,
    Account,
    IdentityVerification,
    Quote,
    Trade,
    Transfer,
    ExternalWallet,
    VerificationKey,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Customer,
        ResourceKind::Account,
        ResourceKind::IdentityVerification,
        ResourceKind::Quote,
        ResourceKind::Trade,
        ResourceKind::Transfer,
        ResourceKind::ExternalWallet,
        ResourceKind::VerificationKey,
    ];

    /// Singular snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Customer => "customer",
            ResourceKind::Account => "account",
            ResourceKind::IdentityVerification => "identity_verification",
            ResourceKind::Quote => "quote",
            ResourceKind::Trade => "trade",
            ResourceKind::Transfer => "transfer",
            ResourceKind::ExternalWallet => "external_wallet",
            ResourceKind::VerificationKey => "verification_key",
        }
    }

    /// Collection segment of the ledger API path (`/api/<collection>`).
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Customer => "customers",
            ResourceKind::Account => "accounts",
            ResourceKind::IdentityVerification => "identity_verifications",
            ResourceKind::Quote => "quotes",
            ResourceKind::Trade => "trades",
            ResourceKind::Transfer => "transfers",
            ResourceKind::ExternalWallet => "external_wallets",
            ResourceKind::VerificationKey => "verification_keys",
        }
    }

    /// States the resource passes through before settling.
    pub fn pending_states(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Customer => &["storing"],
            ResourceKind::Account => &["storing"],
            ResourceKind::IdentityVerification => &["storing", "waiting", "pending", "reviewing"],
            ResourceKind::Quote => &["storing"],
            ResourceKind::Trade => &["storing", "pending", "executing", "settling"],
            ResourceKind::Transfer => &["storing", "reviewing", "pending"],
            ResourceKind::ExternalWallet => &["storing", "pending", "reviewing"],
            ResourceKind::VerificationKey => &["storing", "pending"],
        }
    }

    /// States the resource will not leave without a new action.
    pub fn terminal_states(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Customer => &["unverified", "verified", "rejected", "frozen"],
            ResourceKind::Account => &["created", "failed"],
            ResourceKind::IdentityVerification => &["completed", "failed", "expired"],
            ResourceKind::Quote => &["created", "failed"],
            ResourceKind::Trade => &["completed", "failed", "cancelled"],
            ResourceKind::Transfer => &["completed", "failed"],
            ResourceKind::ExternalWallet => &["completed", "failed", "deleted"],
            ResourceKind::VerificationKey => &["verified", "failed"],
        }
    }

    /// The terminal state that usually means "done" for this kind.
    pub fn success_state(&self) -> &'static str {
        match self {
            ResourceKind::Customer => "unverified",
            ResourceKind::Account | ResourceKind::Quote => "created",
            ResourceKind::IdentityVerification
            | ResourceKind::Trade
            | ResourceKind::Transfer
            | ResourceKind::ExternalWallet => "completed",
            ResourceKind::VerificationKey => "verified",
        }
    }

    /// Terminal states as an owned set.
    pub fn terminal_set(&self) -> BTreeSet<String> {
        self.terminal_states()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Check if `state` is terminal for this kind.
    pub fn is_terminal(&self, state: &str) -> bool {
        self.terminal_states().contains(&state)
    }

    /// Check if `state` belongs to this kind's vocabulary at all.
    pub fn knows_state(&self, state: &str) -> bool {
        self.is_terminal(state) || self.pending_states().contains(&state)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
