//! Key types with secure memory handling.
//!
//! The symmetric key zeroizes on drop and never prints. The access tag is
//! the one derived value that leaves the device, so it is an ordinary
//! value type with constant-time comparison.

use std::fmt;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use chainvault_common::TokenId;

/// Length of the symmetric key in bytes (AES-256).
pub const KEY_LENGTH: usize = 32;

/// Length of the access tag in bytes (one `bytes32` ledger word).
pub const TAG_LENGTH: usize = 32;

/// Length of the KDF salt in bytes.
pub const SALT_LENGTH: usize = 32;

const SALT_DOMAIN: &[u8] = b"chainvault/salt/v1";

/// Symmetric key used for local encryption only.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    key: [u8; KEY_LENGTH],
}

impl SymmetricKey {
    /// Create a key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

/// One-way capability derived from the passphrase.
///
/// The ledger stores it with each record and compares it on every later
/// access.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessTag([u8; TAG_LENGTH]);

impl AccessTag {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; TAG_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the tag bytes.
    pub fn as_bytes(&self) -> &[u8; TAG_LENGTH] {
        &self.0
    }

    /// Compare two tags without leaking the position of the first mismatch.
    pub fn ct_eq(&self, other: &AccessTag) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl fmt::Debug for AccessTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessTag(0x{}…)", hex::encode(&self.0[..4]))
    }
}

/// Salt for key derivation.
///
/// Derived from public data rather than stored, so every client that
/// knows the deployment and the token reconstructs the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSalt([u8; SALT_LENGTH]);

impl VaultSalt {
    /// Salt for records under `token` in the deployment identified by
    /// `scope` (the contract address bytes).
    pub fn for_token(scope: &[u8], token: TokenId) -> Self {
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(SALT_DOMAIN);
        hasher.update(scope);
        hasher.update(token.to_be_bytes());

        let mut salt = [0u8; SALT_LENGTH];
        salt.copy_from_slice(&hasher.finalize());
        Self(salt)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_is_per_token_and_scope() {
        let scope = [0x11u8; 20];
        let a = VaultSalt::for_token(&scope, TokenId::new(1));
        let b = VaultSalt::for_token(&scope, TokenId::new(2));
        let c = VaultSalt::for_token(&[0x22u8; 20], TokenId::new(1));

        assert_eq!(a, VaultSalt::for_token(&scope, TokenId::new(1)));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_access_tag_ct_eq() {
        let a = AccessTag::from_bytes([1u8; TAG_LENGTH]);
        let mut other = [1u8; TAG_LENGTH];
        other[31] = 2;

        assert!(a.ct_eq(&AccessTag::from_bytes([1u8; TAG_LENGTH])));
        assert!(!a.ct_eq(&AccessTag::from_bytes(other)));
    }

    #[test]
    fn test_symmetric_key_debug_redacts() {
        let key = SymmetricKey::from_bytes([0xAB; KEY_LENGTH]);
        assert_eq!(format!("{:?}", key), "SymmetricKey([REDACTED])");
    }
}
