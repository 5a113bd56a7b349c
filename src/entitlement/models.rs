//! Entitlement data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-wallet balance trusted by the UI for gating.
///
/// Derived from the wallet's [`VerificationRecord`] on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementState {
    /// Unconsumed chat turns. Never negative.
    pub messages_remaining: u64,
    /// Hash of the most recent observed payment.
    pub last_payment_hash: Option<String>,
}

impl EntitlementState {
    /// Whether the wallet currently holds any paid messages.
    pub fn is_paid(&self) -> bool {
        self.messages_remaining > 0
    }

    /// Whether a payment is required before the next chat turn.
    pub fn needs_payment(&self) -> bool {
        self.messages_remaining == 0
    }
}

/// Authoritative per-wallet payment record.
///
/// The transaction set is persisted and merged on every reconciliation pass;
/// a transient empty scan can therefore never erase credited payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Count of transfers matched as valid payments.
    pub total_payments: u64,
    /// `total_payments * messages_per_bundle`.
    pub total_messages_purchased: u64,
    /// Cumulative consumed chat turns.
    pub messages_used: u64,
    /// `max(0, total_messages_purchased - messages_used)`.
    pub messages_remaining: u64,
    /// When this record was last updated.
    pub last_verified: DateTime<Utc>,
    /// Transaction hashes already counted, in observation order.
    pub transactions: Vec<String>,
}

impl VerificationRecord {
    /// Create an empty record carrying an externally supplied usage count.
    pub fn zeroed(messages_used: u64) -> Self {
        Self {
            total_payments: 0,
            total_messages_purchased: 0,
            messages_used,
            messages_remaining: 0,
            last_verified: Utc::now(),
            transactions: Vec::new(),
        }
    }

    /// Recompute the derived totals after the transaction set or usage
    /// counter changed.
    pub fn recompute(&mut self, messages_per_bundle: u32) {
        self.total_payments = self.transactions.len() as u64;
        self.total_messages_purchased = self.total_payments * u64::from(messages_per_bundle);
        self.messages_remaining = self
            .total_messages_purchased
            .saturating_sub(self.messages_used);
        self.last_verified = Utc::now();
    }

    /// Count a transaction hash, once. Returns whether it was new.
    pub fn record_transaction(&mut self, hash: &str, messages_per_bundle: u32) -> bool {
        if self.transactions.iter().any(|known| known == hash) {
            return false;
        }
        self.transactions.push(hash.to_string());
        self.recompute(messages_per_bundle);
        true
    }

    /// Merge a scanned set of transaction hashes into the record.
    pub fn merge_observed<I>(&mut self, hashes: I, messages_per_bundle: u32)
    where
        I: IntoIterator<Item = String>,
    {
        for hash in hashes {
            if !self.transactions.iter().any(|known| *known == hash) {
                self.transactions.push(hash);
            }
        }
        self.recompute(messages_per_bundle);
    }

    /// Replace the usage counter with an externally supplied estimate.
    pub fn set_messages_used(&mut self, messages_used: u64, messages_per_bundle: u32) {
        self.messages_used = messages_used;
        self.recompute(messages_per_bundle);
    }

    /// Consume one message, flooring remaining at zero.
    pub fn consume_one(&mut self, messages_per_bundle: u32) {
        if self.messages_remaining > 0 {
            self.messages_used += 1;
        }
        self.recompute(messages_per_bundle);
    }

    /// Derive the UI-facing balance from this record.
    pub fn entitlement_state(&self) -> EntitlementState {
        EntitlementState {
            messages_remaining: self.messages_remaining,
            last_payment_hash: self.transactions.last().cloned(),
        }
    }
}

impl Default for VerificationRecord {
    fn default() -> Self {
        Self::zeroed(0)
    }
}

/// Reconciliation phase of a wallet address.
///
/// Failures leave the previous phase intact; there is no terminal error
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletPhase {
    /// No wallet connected under this address.
    Disconnected,
    /// Connected, not yet reconciled against chain history.
    Unverified,
    /// Reconciliation pass in progress.
    Verifying,
    /// Reconciled against chain history.
    Verified,
}

impl std::fmt::Display for WalletPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletPhase::Disconnected => write!(f, "disconnected"),
            WalletPhase::Unverified => write!(f, "unverified"),
            WalletPhase::Verifying => write!(f, "verifying"),
            WalletPhase::Verified => write!(f, "verified"),
        }
    }
}
