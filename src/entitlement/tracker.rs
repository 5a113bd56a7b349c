//! Entitlement tracker - gates chat usage behind a paid-message balance.

use alloy_primitives::U256;
use dashmap::DashMap;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::chain::{ChainParams, TransferSource, WalletSigner, normalize_address};
use crate::storage::{StateStore, get_json, set_json};

use super::error::{EntitlementError, EntitlementResult};
use super::models::{EntitlementState, VerificationRecord, WalletPhase};

/// Tracks prepaid chat messages per wallet.
///
/// One authoritative [`VerificationRecord`] per address is persisted through
/// the injected store; the UI-facing [`EntitlementState`] is derived from it
/// on every mutation. Reconciliation merges scanned transfer hashes into the
/// persisted transaction set instead of overwriting local state with the scan
/// result, so balances never jump backwards on reconnect.
pub struct EntitlementTracker {
    store: Arc<dyn StateStore>,
    wallet: Arc<dyn WalletSigner>,
    transfers: Arc<dyn TransferSource>,
    params: ChainParams,
    /// Reconciliation phase per address.
    phases: DashMap<String, WalletPhase>,
    /// Payment prompt open/closed per address.
    prompts: DashMap<String, bool>,
    /// Per-address submission locks; a second submission fails fast.
    payment_locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Storage key for the verification record of an address.
fn record_key(address: &str) -> String {
    format!("payments:{address}")
}

/// Storage key for the derived entitlement state of an address.
fn state_key(address: &str) -> String {
    format!("entitlement:{address}")
}

impl EntitlementTracker {
    /// Create a new tracker.
    pub fn new(
        store: Arc<dyn StateStore>,
        wallet: Arc<dyn WalletSigner>,
        transfers: Arc<dyn TransferSource>,
        params: ChainParams,
    ) -> Self {
        Self {
            store,
            wallet,
            transfers,
            params,
            phases: DashMap::new(),
            prompts: DashMap::new(),
            payment_locks: DashMap::new(),
        }
    }

    /// Chain parameters in effect.
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Address of the connected payment wallet, normalized.
    pub fn connected_address(&self) -> Option<String> {
        self.wallet.address().map(|address| normalize_address(&address))
    }

    /// Current reconciliation phase of an address.
    pub fn phase(&self, address: &str) -> WalletPhase {
        let address = normalize_address(address);
        self.phases
            .get(&address)
            .map(|entry| *entry.value())
            .unwrap_or(WalletPhase::Disconnected)
    }

    /// Current balance of an address.
    pub async fn entitlement(&self, address: &str) -> EntitlementResult<EntitlementState> {
        let address = normalize_address(address);
        Ok(get_json(self.store.as_ref(), &state_key(&address))
            .await?
            .unwrap_or_default())
    }

    /// Whether a payment is required before the next chat turn.
    pub async fn needs_payment(&self, address: &str) -> EntitlementResult<bool> {
        Ok(self.entitlement(address).await?.needs_payment())
    }

    /// Open the payment confirmation prompt. No balance change.
    pub fn request_payment(&self, address: &str) {
        self.prompts.insert(normalize_address(address), true);
    }

    /// Close the payment confirmation prompt. No balance change.
    pub fn close_payment_modal(&self, address: &str) {
        self.prompts.insert(normalize_address(address), false);
    }

    /// Whether the payment prompt is currently open for an address.
    pub fn payment_prompt_open(&self, address: &str) -> bool {
        self.prompts
            .get(&normalize_address(address))
            .map(|entry| *entry.value())
            .unwrap_or(false)
    }

    /// Mark an address connected and run a reconciliation pass.
    pub async fn connect(&self, address: &str) -> EntitlementResult<VerificationRecord> {
        let address = normalize_address(address);
        self.phases
            .insert(address.clone(), WalletPhase::Unverified);

        let messages_used = self
            .load_record(&address)
            .await?
            .map(|record| record.messages_used)
            .unwrap_or(0);

        self.verify_wallet_payments(&address, messages_used).await
    }

    /// Submit a bundle payment through the connected wallet and credit the
    /// balance optimistically once the transfer is accepted.
    pub async fn process_payment(&self) -> EntitlementResult<String> {
        let address = self
            .wallet
            .address()
            .ok_or(EntitlementError::WalletUnavailable)?;
        let address = normalize_address(&address);

        let lock = self
            .payment_locks
            .entry(address.clone())
            .or_default()
            .clone();
        let Ok(_guard) = lock.try_lock() else {
            return Err(EntitlementError::PaymentInFlight(address));
        };

        let current = self.wallet.chain_id().await?;
        if current != self.params.network_id {
            return Err(EntitlementError::NetworkMismatch {
                required: self.params.network_id,
                current,
            });
        }

        let before = self.entitlement(&address).await?;
        debug!(
            "wallet {} holds {} messages before payment",
            address, before.messages_remaining
        );

        let value = self.params.bundle_price_wei()?;
        let tx_hash = self
            .wallet
            .send_native_transfer(&self.params.recipient, value)
            .await
            .map_err(|e| EntitlementError::TransactionFailed(e.to_string()))?;

        info!(
            "payment accepted: {} {} from {} to {}, tx {}",
            self.params.price_per_bundle, self.params.token_symbol, address, self.params.recipient, tx_hash
        );

        let mut record = self
            .load_record(&address)
            .await?
            .unwrap_or_default();
        record.record_transaction(&tx_hash, self.params.messages_per_bundle);
        self.persist(&address, &record).await?;

        self.prompts.insert(address, false);
        Ok(tx_hash)
    }

    /// Debit one message after an accepted chat completion.
    pub async fn decrement_message_count(
        &self,
        address: &str,
    ) -> EntitlementResult<EntitlementState> {
        let address = normalize_address(address);
        let mut record = self
            .load_record(&address)
            .await?
            .unwrap_or_default();
        record.consume_one(self.params.messages_per_bundle);
        self.persist(&address, &record).await?;
        Ok(record.entitlement_state())
    }

    /// Reconcile the persisted record against observed on-chain transfers.
    ///
    /// Scanned hashes are merged into the persisted set; `messages_used` is
    /// an external estimate that replaces the stored usage counter. On source
    /// failure the cached record is returned unchanged, or a zeroed record
    /// when none exists.
    pub async fn verify_wallet_payments(
        &self,
        address: &str,
        messages_used: u64,
    ) -> EntitlementResult<VerificationRecord> {
        let address = normalize_address(address);
        let previous = self.phase(&address);
        self.phases.insert(address.clone(), WalletPhase::Verifying);

        let transfers = match self.transfers.transfers_for(&address).await {
            Ok(transfers) => transfers,
            Err(e) => {
                warn!("transfer scan failed for {}: {}", address, e);
                self.phases.insert(address.clone(), previous);
                return match self.load_record(&address).await? {
                    Some(cached) => Ok(cached),
                    None => Ok(VerificationRecord::zeroed(messages_used)),
                };
            }
        };

        let price_wei = self.params.bundle_price_wei()?;
        let recipient = normalize_address(&self.params.recipient);
        let matched = transfers.into_iter().filter_map(|tx| {
            let to_recipient = tx
                .to
                .as_deref()
                .map(|to| normalize_address(to) == recipient)
                .unwrap_or(false);
            let exact_amount = U256::from_str_radix(&tx.value, 10)
                .map(|value| value == price_wei)
                .unwrap_or(false);
            (to_recipient && exact_amount && tx.succeeded()).then_some(tx.hash)
        });

        let mut record = self
            .load_record(&address)
            .await?
            .unwrap_or_default();
        record.merge_observed(matched, self.params.messages_per_bundle);
        record.set_messages_used(messages_used, self.params.messages_per_bundle);
        self.persist(&address, &record).await?;

        debug!(
            "reconciled {}: {} payments, {} purchased, {} used, {} remaining",
            address,
            record.total_payments,
            record.total_messages_purchased,
            record.messages_used,
            record.messages_remaining
        );

        self.phases.insert(address, WalletPhase::Verified);
        Ok(record)
    }

    async fn load_record(&self, address: &str) -> EntitlementResult<Option<VerificationRecord>> {
        Ok(get_json(self.store.as_ref(), &record_key(address)).await?)
    }

    async fn persist(&self, address: &str, record: &VerificationRecord) -> EntitlementResult<()> {
        set_json(self.store.as_ref(), &record_key(address), record).await?;
        set_json(
            self.store.as_ref(),
            &state_key(address),
            &record.entitlement_state(),
        )
        .await?;
        Ok(())
    }
}
