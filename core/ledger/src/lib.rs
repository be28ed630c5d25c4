//! Ledger access for ChainVault.
//!
//! This module provides the wire encoding of vault records and a
//! trait-based interface to the external ledger that stores them, with an
//! in-memory implementation and an Ethereum JSON-RPC implementation.
//!
//! # Design Principles
//! - The ledger is external: only its contract surface is modeled here
//! - Async operations: every ledger interaction is async
//! - Denied reads never reveal whether a record exists

pub mod codec;
pub mod gateway;
pub mod memory;
pub mod registry;
pub mod rpc;

pub use codec::{
    decode_binary, decode_field, encode_binary, encode_field, Bytes32, RecordKey, SiteKey,
    WirePayload, FIELD_WIDTH, MAX_FIELD_LEN,
};
pub use gateway::{
    CollectionInfo, LedgerGateway, RevertReason, Submission, TxHash, TxReceipt, TxStatus, VaultCall,
};
pub use memory::MemoryLedger;
pub use registry::{create_default_registry, GatewayFactory, GatewayRegistry};
pub use rpc::RpcLedger;

pub use alloy_core::primitives::Address;
