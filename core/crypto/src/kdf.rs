//! Key derivation using Argon2id.
//!
//! One Argon2id run produces 64 bytes. The first half becomes the
//! symmetric key. The second half is hashed with a domain label into the
//! access tag, so the tag reveals nothing about the key or the passphrase.

use argon2::{Algorithm, Argon2, Params, Version};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::keys::{AccessTag, SymmetricKey, VaultSalt, KEY_LENGTH, TAG_LENGTH};
use chainvault_common::{Error, Result};

const TAG_DOMAIN: &[u8] = b"chainvault/access-tag/v1";

/// Parameters for Argon2id key derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (e.g., 65536 = 64 MiB).
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl KdfParams {
    /// Create parameters suitable for interactive use.
    ///
    /// These parameters provide a balance between security and usability,
    /// targeting approximately 0.5-1 second of derivation time.
    pub fn interactive() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
        }
    }

    /// Create parameters suitable for sensitive data.
    ///
    /// Higher security parameters that may take several seconds.
    pub fn sensitive() -> Self {
        Self {
            memory_cost: 262144, // 256 MiB
            time_cost: 4,
            parallelism: 4,
        }
    }

    /// Create moderate parameters for mobile devices.
    pub fn moderate() -> Self {
        Self {
            memory_cost: 32768, // 32 MiB
            time_cost: 3,
            parallelism: 2,
        }
    }

    /// Minimal cost for test suites. Not reachable through `from_preset`.
    #[doc(hidden)]
    pub fn testing() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    /// Look up a preset by name.
    pub fn from_preset(name: &str) -> Result<Self> {
        match name {
            "interactive" => Ok(Self::interactive()),
            "moderate" => Ok(Self::moderate()),
            "sensitive" => Ok(Self::sensitive()),
            other => Err(Error::InvalidInput(format!(
                "Unknown KDF preset '{}'. Use: interactive, moderate, or sensitive",
                other
            ))),
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Output of a single derivation.
#[derive(Debug, Clone)]
pub struct DerivedKeys {
    /// Key for local encryption. Never leaves the device.
    pub key: SymmetricKey,
    /// Capability submitted to the ledger.
    pub tag: AccessTag,
}

/// Turns a passphrase into a symmetric key and an access tag.
#[derive(Debug, Clone, Default)]
pub struct KeyDeriver {
    params: KdfParams,
}

impl KeyDeriver {
    /// Create a deriver with the given cost parameters.
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    /// Derive the key and tag for `passphrase`.
    ///
    /// # Postconditions
    /// - Same passphrase, salt and parameters always give the same pair
    ///
    /// # Errors
    /// - Returns error if passphrase is empty
    /// - Returns error if Argon2id parameters are invalid
    pub fn derive(&self, passphrase: &[u8], salt: &VaultSalt) -> Result<DerivedKeys> {
        if passphrase.is_empty() {
            return Err(Error::InvalidInput("Passphrase cannot be empty".to_string()));
        }

        let argon2_params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            Some(KEY_LENGTH + TAG_LENGTH),
        )
        .map_err(|e| Error::Crypto(format!("Invalid KDF parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

        let mut okm = Zeroizing::new([0u8; KEY_LENGTH + TAG_LENGTH]);
        argon2
            .hash_password_into(passphrase, salt.as_bytes(), okm.as_mut_slice())
            .map_err(|e| Error::Crypto(format!("Key derivation failed: {}", e)))?;

        let mut key_bytes = [0u8; KEY_LENGTH];
        key_bytes.copy_from_slice(&okm[..KEY_LENGTH]);
        let key = SymmetricKey::from_bytes(key_bytes);

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(TAG_DOMAIN);
        hasher.update(&okm[KEY_LENGTH..]);
        let mut tag_bytes = [0u8; TAG_LENGTH];
        tag_bytes.copy_from_slice(&hasher.finalize());

        Ok(DerivedKeys {
            key,
            tag: AccessTag::from_bytes(tag_bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainvault_common::TokenId;

    fn salt() -> VaultSalt {
        VaultSalt::for_token(&[0x42u8; 20], TokenId::new(7))
    }

    #[test]
    fn test_derive_deterministic() {
        let deriver = KeyDeriver::new(KdfParams::testing());

        let a = deriver.derive(b"corp-key", &salt()).unwrap();
        let b = deriver.derive(b"corp-key", &salt()).unwrap();

        assert_eq!(a.key.as_bytes(), b.key.as_bytes());
        assert_eq!(a.tag, b.tag);
    }

    #[test]
    fn test_derive_different_passphrase() {
        let deriver = KeyDeriver::new(KdfParams::testing());

        let a = deriver.derive(b"passphrase-1", &salt()).unwrap();
        let b = deriver.derive(b"passphrase-2", &salt()).unwrap();

        assert_ne!(a.key.as_bytes(), b.key.as_bytes());
        assert_ne!(a.tag, b.tag);
    }

    #[test]
    fn test_derive_different_salt() {
        let deriver = KeyDeriver::new(KdfParams::testing());
        let other = VaultSalt::for_token(&[0x42u8; 20], TokenId::new(8));

        let a = deriver.derive(b"corp-key", &salt()).unwrap();
        let b = deriver.derive(b"corp-key", &other).unwrap();

        assert_ne!(a.tag, b.tag);
    }

    #[test]
    fn test_tag_is_not_the_key() {
        let deriver = KeyDeriver::new(KdfParams::testing());
        let keys = deriver.derive(b"corp-key", &salt()).unwrap();

        assert_ne!(keys.key.as_bytes(), keys.tag.as_bytes());
    }

    #[test]
    fn test_empty_passphrase_fails() {
        let deriver = KeyDeriver::new(KdfParams::testing());
        assert!(matches!(
            deriver.derive(b"", &salt()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_params_fail() {
        let deriver = KeyDeriver::new(KdfParams {
            memory_cost: 1,
            time_cost: 1,
            parallelism: 1,
        });
        assert!(matches!(
            deriver.derive(b"corp-key", &salt()),
            Err(Error::Crypto(_))
        ));
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(KdfParams::from_preset("moderate").unwrap(), KdfParams::moderate());
        assert!(KdfParams::from_preset("extreme").is_err());
        assert!(matches!(
            KdfParams::from_preset("testing"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_params_serialization() {
        let json = serde_json::to_string(&KdfParams::sensitive()).unwrap();
        let restored: KdfParams = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, KdfParams::sensitive());
    }
}
