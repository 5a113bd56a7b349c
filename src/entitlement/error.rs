//! Entitlement tracker error types.

use thiserror::Error;

use crate::chain::ChainError;
use crate::storage::StorageError;

/// Result type for entitlement operations.
pub type EntitlementResult<T> = Result<T, EntitlementError>;

/// Errors that can occur while tracking or purchasing entitlements.
#[derive(Debug, Error)]
pub enum EntitlementError {
    /// No wallet is connected.
    #[error("wallet not connected, connect a wallet first")]
    WalletUnavailable,

    /// The wallet is on the wrong network.
    #[error("wrong network: required chain id {required}, current chain id {current}")]
    NetworkMismatch { required: u64, current: u64 },

    /// Another payment submission for this wallet is still in flight.
    #[error("payment already in progress for {0}")]
    PaymentInFlight(String),

    /// The transfer was rejected or reverted; balance left unchanged.
    #[error("payment transaction failed: {0}")]
    TransactionFailed(String),

    /// The chain data source could not be reached.
    #[error("chain data source unavailable: {0}")]
    DataSourceUnavailable(#[from] ChainError),

    /// Persisted state could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
