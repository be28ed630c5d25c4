//! Symmetric encryption using AES-256-CBC with PKCS#7 padding.
//!
//! CBC gives confidentiality only. There is no authentication tag, so a
//! modified ciphertext is not detected unless the padding check happens to
//! fail. The same holds for a wrong key: padding validation catches it with
//! high but not certain probability, and callers must treat a successful
//! decrypt as "plausibly correct" rather than "verified".

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use crate::keys::SymmetricKey;
use chainvault_common::{Error, Result};

/// AES block size in bytes; also the IV length.
pub const BLOCK_SIZE: usize = 16;

/// IV length for AES-CBC.
pub const IV_SIZE: usize = BLOCK_SIZE;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Ciphertext together with the IV it was produced under.
///
/// The two are always generated and stored as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    /// Padded ciphertext; a multiple of `BLOCK_SIZE`.
    pub ciphertext: Vec<u8>,
    /// Initialization vector; `IV_SIZE` bytes when produced by `encrypt`.
    pub iv: Vec<u8>,
}

/// Encrypt plaintext under `key` with a fresh random IV.
///
/// # Postconditions
/// - Returns ciphertext and IV
/// - The IV is new on every call, so encrypting the same plaintext twice
///   yields different ciphertexts
/// - Ciphertext length is plaintext length rounded up to the next block
///   (a full padding block is added when already aligned)
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> EncryptedPayload {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    EncryptedPayload {
        ciphertext,
        iv: iv.to_vec(),
    }
}

/// Decrypt a payload under `key`.
///
/// # Errors
/// - `DecryptionFailure` if the IV is not `IV_SIZE` bytes
/// - `DecryptionFailure` if the ciphertext is empty or not block-aligned
/// - `DecryptionFailure` if the padding is invalid (usually a wrong key)
pub fn decrypt(payload: &EncryptedPayload, key: &SymmetricKey) -> Result<Vec<u8>> {
    let iv: [u8; IV_SIZE] = payload
        .iv
        .as_slice()
        .try_into()
        .map_err(|_| Error::DecryptionFailure)?;

    if payload.ciphertext.is_empty() || payload.ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(Error::DecryptionFailure);
    }

    Aes256CbcDec::new(key.as_bytes().into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&payload.ciphertext)
        .map_err(|_| Error::DecryptionFailure)
}
