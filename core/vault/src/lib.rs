//! Vault client for ChainVault.
//!
//! This module provides:
//! - Client configuration layered from defaults, file and environment
//! - The signing account used for ledger writes
//! - Encrypted create/read/update/delete of secrets on the ledger
//!
//! # Architecture
//! The client sits between the user interface and a ledger gateway. All
//! encryption and decryption happens here; the ledger only ever sees
//! ciphertext, IVs and access tags.

pub mod client;
pub mod config;
pub mod wallet;

pub use client::{TxState, VaultClient};
pub use config::VaultConfig;
pub use wallet::WalletAccount;
