//! Ledger gateway trait definition.
//!
//! The ledger is external. This trait describes the slice of its contract
//! the vault consumes: one read call, three record-mutating transactions,
//! receipt lookup, and collection metadata.

use std::fmt;

use alloy_core::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::codec::{RecordKey, WirePayload};
use chainvault_common::Result;
use chainvault_crypto::AccessTag;

/// Hash identifying a submitted transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

/// A record-mutating contract call.
///
/// Create and update always carry ciphertext and IV together.
#[derive(Debug, Clone)]
pub enum VaultCall {
    /// `storePassword(token, tag, url, user, ciphertext, iv)`
    Create {
        key: RecordKey,
        tag: AccessTag,
        payload: WirePayload,
    },
    /// `updatePassword(token, tag, url, user, ciphertext, iv)`
    Update {
        key: RecordKey,
        tag: AccessTag,
        payload: WirePayload,
    },
    /// `deletePassword(token, tag, url, user)`
    Delete { key: RecordKey, tag: AccessTag },
}

impl VaultCall {
    /// Contract method name.
    pub fn method(&self) -> &'static str {
        match self {
            VaultCall::Create { .. } => "storePassword",
            VaultCall::Update { .. } => "updatePassword",
            VaultCall::Delete { .. } => "deletePassword",
        }
    }

    /// Address the call targets.
    pub fn key(&self) -> &RecordKey {
        match self {
            VaultCall::Create { key, .. }
            | VaultCall::Update { key, .. }
            | VaultCall::Delete { key, .. } => key,
        }
    }

    /// Access tag presented with the call.
    pub fn tag(&self) -> &AccessTag {
        match self {
            VaultCall::Create { tag, .. }
            | VaultCall::Update { tag, .. }
            | VaultCall::Delete { tag, .. } => tag,
        }
    }
}

/// Why the ledger refused a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    /// Wrong access tag, or no record at the address.
    AccessDenied,
    /// The sender does not hold the token.
    NotTokenOwner,
    /// A record already exists at the address.
    RecordExists,
    /// Any other reason reported by the contract.
    Other(String),
}

impl RevertReason {
    /// Classify a free-form revert string from a contract.
    pub fn classify(reason: &str) -> Self {
        let lower = reason.to_ascii_lowercase();
        if lower.contains("owner") {
            RevertReason::NotTokenOwner
        } else if lower.contains("exists") {
            RevertReason::RecordExists
        } else if ["key", "access", "not found", "no password", "unauthor"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            RevertReason::AccessDenied
        } else {
            RevertReason::Other(reason.to_string())
        }
    }
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevertReason::AccessDenied => write!(f, "access denied"),
            RevertReason::NotTokenOwner => write!(f, "caller does not own the token"),
            RevertReason::RecordExists => write!(f, "record already exists"),
            RevertReason::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// Result of handing a transaction to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Accepted for inclusion; confirmation still pending.
    Pending(TxHash),
    /// Refused before inclusion (e.g. failed pre-flight simulation).
    Rejected(RevertReason),
}

/// Final status of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Executed successfully.
    Confirmed,
    /// Included but reverted.
    Reverted(RevertReason),
}

/// Receipt for an included transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash.
    pub hash: TxHash,
    /// Execution status.
    pub status: TxStatus,
    /// Block the transaction was included in, when known.
    pub block_number: Option<u64>,
}

/// Name and symbol of the token collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub symbol: String,
}

/// Gateway to the external ledger.
///
/// Implementations own transport concerns (connections, request timeouts)
/// and report denial of a read as `Error::AuthorizationOrNotFound`
/// without saying whether the record exists.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Gateway name (e.g., "rpc", "memory").
    fn name(&self) -> &str;

    /// Read the payload stored at `key`.
    ///
    /// # Errors
    /// - `AuthorizationOrNotFound` if the tag does not match or no record
    ///   exists
    /// - `Network` on transport failure
    async fn read(&self, from: Address, key: &RecordKey, tag: &AccessTag) -> Result<WirePayload>;

    /// Submit a record-mutating transaction signed by `from`.
    ///
    /// # Errors
    /// - `Network` on transport failure
    async fn submit(&self, from: Address, call: &VaultCall) -> Result<Submission>;

    /// Look up the receipt of a submitted transaction.
    ///
    /// Returns `None` while the transaction is still pending.
    ///
    /// A transaction that passed `submit` but reverted when mined may come
    /// back as `RevertReason::Other` when the ledger does not report why.
    /// Callers then see `TransactionReverted` rather than
    /// `AuthorizationOrNotFound`, even for a tag that stopped matching.
    async fn receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>>;

    /// Read collection name and symbol.
    async fn collection_info(&self) -> Result<CollectionInfo>;
}
