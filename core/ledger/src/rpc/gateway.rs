//! Ledger gateway over Ethereum JSON-RPC.

use alloy_core::primitives::Address;
use alloy_core::sol_types::decode_revert_reason;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::client::{JsonRpcClient, RpcErrorObject};
use super::contract;
use crate::codec::{decode_binary, encode_binary, RecordKey, WirePayload};
use crate::gateway::{
    CollectionInfo, LedgerGateway, RevertReason, Submission, TxHash, TxReceipt, TxStatus, VaultCall,
};
use chainvault_common::{Error, Result};
use chainvault_crypto::AccessTag;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    block_number: Option<String>,
}

fn parse_quantity(text: &str) -> Option<u64> {
    u64::from_str_radix(text.trim_start_matches("0x"), 16).ok()
}

fn revert_reason(error: &RpcErrorObject) -> RevertReason {
    let decoded = error
        .revert_data()
        .and_then(|data| decode_binary(data).ok())
        .and_then(|bytes| decode_revert_reason(&bytes));

    let reason = decoded.unwrap_or_else(|| {
        error
            .message
            .trim_start_matches("execution reverted")
            .trim_start_matches(':')
            .trim()
            .to_string()
    });
    RevertReason::classify(&reason)
}

/// Gateway that talks to a deployed vault contract through a JSON-RPC node.
///
/// Writes are sent with `eth_sendTransaction`, so the node (or the wallet
/// behind it) must hold the key for the sending account.
pub struct RpcLedger {
    client: JsonRpcClient,
    contract: Address,
}

impl RpcLedger {
    /// Create a gateway for `contract` reachable through `endpoint`.
    pub fn new(endpoint: Url, contract: Address, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: JsonRpcClient::new(endpoint, request_timeout)?,
            contract,
        })
    }

    fn tx_object(&self, from: Option<Address>, data: &[u8]) -> serde_json::Value {
        let mut tx = json!({
            "to": self.contract.to_string(),
            "data": encode_binary(data),
        });
        if let Some(from) = from {
            tx["from"] = json!(from.to_string());
        }
        tx
    }

    /// `eth_call` against the contract. Reverts come back in the inner result.
    async fn call(
        &self,
        from: Option<Address>,
        data: &[u8],
    ) -> Result<std::result::Result<Vec<u8>, RevertReason>> {
        let params = json!([self.tx_object(from, data), "latest"]);
        match self.client.request::<String>("eth_call", params).await? {
            Ok(Some(result)) => Ok(Ok(decode_binary(&result)?)),
            Ok(None) => Err(Error::Network("eth_call returned no result".to_string())),
            Err(error) if error.is_revert() => Ok(Err(revert_reason(&error))),
            Err(error) => Err(Error::Network(format!(
                "eth_call failed ({}): {}",
                error.code, error.message
            ))),
        }
    }
}

#[async_trait]
impl LedgerGateway for RpcLedger {
    fn name(&self) -> &str {
        "rpc"
    }

    async fn read(&self, from: Address, key: &RecordKey, tag: &AccessTag) -> Result<WirePayload> {
        let data = contract::encode_read(key, tag);
        match self.call(Some(from), &data).await? {
            Ok(returned) => contract::decode_read(&returned),
            Err(reason) => {
                debug!(reason = %reason, "getPassword reverted");
                Err(Error::AuthorizationOrNotFound)
            }
        }
    }

    async fn submit(&self, from: Address, call: &VaultCall) -> Result<Submission> {
        let data = contract::encode_call(call)?;

        // Simulate first; a mined revert carries no reason string.
        if let Err(reason) = self.call(Some(from), &data).await? {
            warn!(method = call.method(), reason = %reason, "Pre-flight simulation reverted");
            return Ok(Submission::Rejected(reason));
        }

        let params = json!([self.tx_object(Some(from), &data)]);
        match self.client.request::<String>("eth_sendTransaction", params).await? {
            Ok(Some(hash)) => {
                let bytes: [u8; 32] = decode_binary(&hash)?.try_into().map_err(|_| {
                    Error::Serialization(format!("Malformed transaction hash: {}", hash))
                })?;
                Ok(Submission::Pending(TxHash(bytes)))
            }
            Ok(None) => Err(Error::Network(
                "eth_sendTransaction returned no hash".to_string(),
            )),
            Err(error) if error.is_revert() => Ok(Submission::Rejected(revert_reason(&error))),
            Err(error) if error.message.to_ascii_lowercase().contains("unknown account") => {
                Err(Error::WalletUnavailable)
            }
            Err(error) => Err(Error::Network(format!(
                "eth_sendTransaction failed ({}): {}",
                error.code, error.message
            ))),
        }
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>> {
        let params = json!([hash.to_string()]);
        let receipt = match self
            .client
            .request::<RpcReceipt>("eth_getTransactionReceipt", params)
            .await?
        {
            Ok(receipt) => receipt,
            Err(error) => {
                return Err(Error::Network(format!(
                    "eth_getTransactionReceipt failed ({}): {}",
                    error.code, error.message
                )))
            }
        };

        Ok(receipt.map(|receipt| {
            // Receipts carry no revert reason
            let status = match receipt.status.as_deref().and_then(parse_quantity) {
                Some(1) => TxStatus::Confirmed,
                _ => TxStatus::Reverted(RevertReason::Other("execution reverted".to_string())),
            };
            TxReceipt {
                hash: *hash,
                status,
                block_number: receipt.block_number.as_deref().and_then(parse_quantity),
            }
        }))
    }

    async fn collection_info(&self) -> Result<CollectionInfo> {
        let name = match self.call(None, &contract::encode_name()).await? {
            Ok(data) => contract::decode_string(&data)?,
            Err(reason) => return Err(Error::TransactionReverted(reason.to_string())),
        };
        let symbol = match self.call(None, &contract::encode_symbol()).await? {
            Ok(data) => contract::decode_string(&data)?,
            Err(reason) => return Err(Error::TransactionReverted(reason.to_string())),
        };
        Ok(CollectionInfo { name, symbol })
    }
}
