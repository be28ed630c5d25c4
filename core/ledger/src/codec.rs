//! Wire encoding for vault records.
//!
//! Text fields (url, username) become fixed 32-byte words: UTF-8 bytes
//! followed by NUL padding. At most 31 bytes of text are accepted so the
//! word always ends in at least one NUL. Longer input is rejected, never
//! truncated, and the same function serves the write and the read path, so
//! a lookup always reproduces the bytes used at creation.
//!
//! Binary fields (ciphertext, iv) travel as `0x`-prefixed lowercase hex.

use serde::{Deserialize, Serialize};
use std::fmt;

use chainvault_common::{Error, Result, SiteAddress, TokenId};
use chainvault_crypto::EncryptedPayload;

/// Width of an encoded text field in bytes.
pub const FIELD_WIDTH: usize = 32;

/// Longest text accepted for a field, in UTF-8 bytes.
pub const MAX_FIELD_LEN: usize = FIELD_WIDTH - 1;

/// A fixed-width ledger word.
pub type Bytes32 = [u8; FIELD_WIDTH];

/// Encode a short text field into a fixed-width word.
///
/// # Errors
/// - `InputTooLong` if `text` exceeds `MAX_FIELD_LEN` bytes
pub fn encode_field(field: &'static str, text: &str) -> Result<Bytes32> {
    let bytes = text.as_bytes();
    if bytes.len() > MAX_FIELD_LEN {
        return Err(Error::InputTooLong {
            field,
            len: bytes.len(),
            max: MAX_FIELD_LEN,
        });
    }

    let mut word = [0u8; FIELD_WIDTH];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(word)
}

/// Decode a fixed-width word back into text.
///
/// Reads up to the first NUL.
pub fn decode_field(word: &Bytes32) -> Result<String> {
    let end = word.iter().position(|&b| b == 0).unwrap_or(FIELD_WIDTH);
    String::from_utf8(word[..end].to_vec())
        .map_err(|e| Error::Serialization(format!("Field is not valid UTF-8: {}", e)))
}

/// Encode bytes for transport.
pub fn encode_binary(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode transported bytes. The `0x` prefix is optional.
pub fn decode_binary(text: &str) -> Result<Vec<u8>> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(digits).map_err(|e| Error::Serialization(format!("Invalid hex data: {}", e)))
}

/// Encoded (url, username) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteKey {
    /// Encoded url.
    pub url: Bytes32,
    /// Encoded username.
    pub user: Bytes32,
}

impl SiteKey {
    /// Encode a url and username.
    pub fn encode(url: &str, username: &str) -> Result<Self> {
        Ok(Self {
            url: encode_field("url", url)?,
            user: encode_field("username", username)?,
        })
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (decode_field(&self.user), decode_field(&self.url)) {
            (Ok(user), Ok(url)) => write!(f, "{}@{}", user, url),
            _ => write!(f, "{}@{}", encode_binary(&self.user), encode_binary(&self.url)),
        }
    }
}

/// Encoded address of a record on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Token the record is stored under.
    pub token: TokenId,
    /// Encoded site identity.
    pub site: SiteKey,
}

impl RecordKey {
    /// Encode a logical address.
    ///
    /// # Errors
    /// - `InputTooLong` if the url or username does not fit
    pub fn encode(address: &SiteAddress) -> Result<Self> {
        Ok(Self {
            token: address.token(),
            site: SiteKey::encode(address.url(), address.username())?,
        })
    }
}

/// Ciphertext and IV as they travel over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePayload {
    /// Hex-encoded ciphertext.
    pub ciphertext: String,
    /// Hex-encoded IV.
    pub iv: String,
}

impl WirePayload {
    /// Encode an encrypted payload for transport.
    pub fn encode(payload: &EncryptedPayload) -> Self {
        Self {
            ciphertext: encode_binary(&payload.ciphertext),
            iv: encode_binary(&payload.iv),
        }
    }

    /// Decode back into raw bytes.
    ///
    /// Lengths are not validated here; the cipher rejects bad ones.
    pub fn decode(&self) -> Result<EncryptedPayload> {
        Ok(EncryptedPayload {
            ciphertext: decode_binary(&self.ciphertext)?,
            iv: decode_binary(&self.iv)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_field_pads_with_nul() {
        let word = encode_field("url", "example.com").unwrap();
        assert_eq!(&word[..11], b"example.com");
        assert!(word[11..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encode_field_limit() {
        let max = "a".repeat(MAX_FIELD_LEN);
        assert!(encode_field("url", &max).is_ok());

        let over = "a".repeat(FIELD_WIDTH);
        match encode_field("url", &over) {
            Err(Error::InputTooLong { field, len, max }) => {
                assert_eq!(field, "url");
                assert_eq!(len, 32);
                assert_eq!(max, 31);
            }
            other => panic!("expected InputTooLong, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_field_counts_utf8_bytes() {
        // 16 two-byte characters = 32 bytes.
        let text = "é".repeat(16);
        assert!(matches!(
            encode_field("username", &text),
            Err(Error::InputTooLong { len: 32, .. })
        ));
    }

    #[test]
    fn test_empty_field_is_all_zero() {
        assert_eq!(encode_field("username", "").unwrap(), [0u8; FIELD_WIDTH]);
    }

    #[test]
    fn test_encoding_is_stable_between_calls() {
        let write = RecordKey::encode(&SiteAddress::new(7u64, "example.com", "alice")).unwrap();
        let read = RecordKey::encode(&SiteAddress::new(7u64, "example.com", "alice")).unwrap();
        assert_eq!(write, read);
    }

    #[test]
    fn test_record_key_rejects_long_username() {
        let address = SiteAddress::new(1u64, "example.com", "x".repeat(40));
        assert!(matches!(
            RecordKey::encode(&address),
            Err(Error::InputTooLong { field: "username", .. })
        ));
    }

    #[test]
    fn test_site_key_display() {
        let site = SiteKey::encode("example.com", "alice").unwrap();
        assert_eq!(site.to_string(), "alice@example.com");

        let mut garbled = site;
        garbled.user[0] = 0xff;
        // Not UTF-8, shown as hex
        let shown = garbled.to_string();
        assert!(shown.starts_with("0xff"));
        assert!(shown.ends_with(&encode_binary(&site.url)));
    }

    #[test]
    fn test_binary_encoding() {
        assert_eq!(encode_binary(&[0xde, 0xad, 0xbe, 0xef]), "0xdeadbeef");
        assert_eq!(decode_binary("0xDEADBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_binary("deadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_binary("0x").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_binary_rejects_malformed() {
        assert!(matches!(decode_binary("0xabc"), Err(Error::Serialization(_))));
        assert!(matches!(decode_binary("0xzz"), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_wire_payload() {
        let payload = EncryptedPayload {
            ciphertext: vec![1, 2, 3, 4],
            iv: vec![9; 16],
        };
        let wire = WirePayload::encode(&payload);
        assert_eq!(wire.ciphertext, "0x01020304");
        assert_eq!(wire.decode().unwrap(), payload);
    }

    proptest! {
        #[test]
        fn field_decodes_to_original(text in "[a-zA-Z0-9.@_-]{0,31}") {
            let word = encode_field("url", &text).unwrap();
            prop_assert_eq!(decode_field(&word).unwrap(), text);
        }

        #[test]
        fn binary_decodes_to_original(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
            prop_assert_eq!(decode_binary(&encode_binary(&bytes)).unwrap(), bytes);
        }
    }
}
