//! Entitlement tracking.
//!
//! Maintains a per-wallet count of prepaid chat messages: debited once per
//! accepted completion, credited after a submitted bundle payment, and
//! reconciled against observed on-chain transfers to the service wallet.
//!
//! Reconciliation is best-effort by design: the transfer scan is an
//! opportunistic cross-check, not a verifiable ledger. See `tracker` for the
//! merge semantics.

mod error;
mod models;
mod tracker;

pub use error::{EntitlementError, EntitlementResult};
pub use models::{EntitlementState, VerificationRecord, WalletPhase};
pub use tracker::EntitlementTracker;
