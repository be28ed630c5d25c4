//! Ethereum JSON-RPC ledger gateway.
//!
//! Reads go through `eth_call`. Writes are simulated with `eth_call` to
//! capture a revert reason, then sent with `eth_sendTransaction`, and their
//! receipts are fetched with `eth_getTransactionReceipt`.

pub mod client;
pub mod contract;
pub mod gateway;

pub use client::JsonRpcClient;
pub use gateway::RpcLedger;
