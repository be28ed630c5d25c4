//! In-memory ledger for testing.
//!
//! Enforces the same rules as the deployed contract: the sender must own
//! the token to write, the access tag must match on every access after
//! creation, and one address holds at most one record. Transactions are
//! applied at submission and confirm immediately unless confirmations are
//! stalled.

use async_trait::async_trait;
use alloy_core::primitives::Address;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::debug;

use crate::codec::{RecordKey, WirePayload};
use crate::gateway::{
    CollectionInfo, LedgerGateway, RevertReason, Submission, TxHash, TxReceipt, TxStatus, VaultCall,
};
use chainvault_common::{Error, Result, TokenId};
use chainvault_crypto::AccessTag;

#[derive(Debug, Clone)]
struct StoredRecord {
    tag: AccessTag,
    payload: WirePayload,
}

#[derive(Default)]
struct LedgerState {
    owners: HashMap<TokenId, Address>,
    records: HashMap<RecordKey, StoredRecord>,
    receipts: HashMap<TxHash, TxReceipt>,
    next_token: u64,
    block: u64,
}

/// In-memory ledger.
///
/// Useful for testing and development. All state is lost on drop.
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    stalled: AtomicBool,
    info: CollectionInfo,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState {
                next_token: 1,
                ..LedgerState::default()
            }),
            stalled: AtomicBool::new(false),
            info: CollectionInfo {
                name: "Password Manager, Distributed".to_string(),
                symbol: "PWmD".to_string(),
            },
        }
    }

    fn state_read(&self) -> Result<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| Error::Network("Ledger state poisoned".to_string()))
    }

    fn state_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| Error::Network("Ledger state poisoned".to_string()))
    }

    /// Mint the next token to `owner`.
    pub fn mint(&self, owner: Address) -> Result<TokenId> {
        let mut state = self.state_write()?;
        let token = TokenId::new(state.next_token);
        state.next_token += 1;
        state.owners.insert(token, owner);
        debug!(token = %token, owner = %owner, "Token minted");
        Ok(token)
    }

    /// Number of stored records.
    pub fn record_count(&self) -> Result<usize> {
        Ok(self.state_read()?.records.len())
    }

    /// Withhold receipts so submitted transactions never confirm.
    pub fn stall_confirmations(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    fn authorize(state: &LedgerState, key: &RecordKey, tag: &AccessTag) -> std::result::Result<(), RevertReason> {
        match state.records.get(key) {
            Some(record) if record.tag.ct_eq(tag) => Ok(()),
            _ => Err(RevertReason::AccessDenied),
        }
    }

    fn apply(state: &mut LedgerState, from: Address, call: &VaultCall) -> std::result::Result<(), RevertReason> {
        let key = call.key();
        if state.owners.get(&key.token) != Some(&from) {
            return Err(RevertReason::NotTokenOwner);
        }

        match call {
            VaultCall::Create { key, tag, payload } => {
                if state.records.contains_key(key) {
                    return Err(RevertReason::RecordExists);
                }
                state.records.insert(
                    *key,
                    StoredRecord {
                        tag: *tag,
                        payload: payload.clone(),
                    },
                );
            }
            VaultCall::Update { key, tag, payload } => {
                Self::authorize(state, key, tag)?;
                if let Some(record) = state.records.get_mut(key) {
                    record.payload = payload.clone();
                }
            }
            VaultCall::Delete { key, tag } => {
                Self::authorize(state, key, tag)?;
                state.records.remove(key);
            }
        }
        Ok(())
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerGateway for MemoryLedger {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read(&self, _from: Address, key: &RecordKey, tag: &AccessTag) -> Result<WirePayload> {
        let state = self.state_read()?;
        Self::authorize(&state, key, tag).map_err(|_| Error::AuthorizationOrNotFound)?;
        state
            .records
            .get(key)
            .map(|record| record.payload.clone())
            .ok_or(Error::AuthorizationOrNotFound)
    }

    async fn submit(&self, from: Address, call: &VaultCall) -> Result<Submission> {
        let mut hash = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut hash);
        let hash = TxHash(hash);

        let mut state = self.state_write()?;
        state.block += 1;
        let status = match Self::apply(&mut state, from, call) {
            Ok(()) => TxStatus::Confirmed,
            Err(reason) => TxStatus::Reverted(reason),
        };
        debug!(method = call.method(), site = %call.key().site, tx = %hash, status = ?status, "Transaction applied");

        let receipt = TxReceipt {
            hash,
            status,
            block_number: Some(state.block),
        };
        state.receipts.insert(hash, receipt);

        Ok(Submission::Pending(hash))
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>> {
        if self.stalled.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.state_read()?.receipts.get(hash).cloned())
    }

    async fn collection_info(&self) -> Result<CollectionInfo> {
        Ok(self.info.clone())
    }
}
