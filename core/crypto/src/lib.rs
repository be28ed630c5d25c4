//! Cryptographic primitives for ChainVault.
//!
//! This module provides:
//! - Key derivation using Argon2id, yielding a local key and a ledger tag
//! - AES-256-CBC encryption with a fresh random IV per call
//! - Key types with automatic zeroization
//!
//! # Security Guarantees
//! - Symmetric key material is zeroized on drop and never printed
//! - Only the access tag is meant to leave the device
//! - Access tags compare in constant time
//!
//! CBC carries no integrity check; see [`cipher`] for what that implies.

pub mod cipher;
pub mod kdf;
pub mod keys;

pub use cipher::{decrypt, encrypt, EncryptedPayload, BLOCK_SIZE, IV_SIZE};
pub use kdf::{DerivedKeys, KdfParams, KeyDeriver};
pub use keys::{AccessTag, SymmetricKey, VaultSalt, KEY_LENGTH, TAG_LENGTH};
