//! Common types used throughout ChainVault.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

/// Identifier of the non-fungible token a record is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(u64);

impl TokenId {
    /// Create a token identifier.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Big-endian bytes, as used for salt derivation.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<u64> for TokenId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for TokenId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| crate::Error::InvalidInput(format!("Invalid token id '{}': {}", s, e)))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical address of a vault record.
///
/// Bundles the token with the site url and username so the three are
/// always passed together and can never be transposed at a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteAddress {
    token: TokenId,
    url: String,
    username: String,
}

impl SiteAddress {
    /// Create a new address.
    ///
    /// Length limits are enforced when the address is encoded for the
    /// ledger, not here.
    pub fn new(token: impl Into<TokenId>, url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            url: url.into(),
            username: username.into(),
        }
    }

    /// Token the record lives under.
    pub fn token(&self) -> TokenId {
        self.token
    }

    /// Site url.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Account username at the site.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Display for SiteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token {} / {}@{}", self.token, self.username, self.url)
    }
}

/// Sensitive data wrapper that zeroizes on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SensitiveBytes(Vec<u8>);

impl SensitiveBytes {
    /// Get a reference to the inner bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SensitiveBytes {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for SensitiveBytes {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl fmt::Debug for SensitiveBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveBytes([REDACTED; {} bytes])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_token_id_parse() {
        let token: TokenId = " 7 ".parse().unwrap();
        assert_eq!(token, TokenId::new(7));
        assert_eq!(token.to_string(), "7");
    }

    #[test]
    fn test_token_id_parse_rejects_garbage() {
        assert!("seven".parse::<TokenId>().is_err());
        assert!("-1".parse::<TokenId>().is_err());
        assert!("".parse::<TokenId>().is_err());
    }

    #[test]
    fn test_site_address_accessors() {
        let address = SiteAddress::new(7u64, "example.com", "alice");
        assert_eq!(address.token(), TokenId::new(7));
        assert_eq!(address.url(), "example.com");
        assert_eq!(address.username(), "alice");
        assert_eq!(address.to_string(), "token 7 / alice@example.com");
    }

    #[test]
    fn test_sensitive_bytes_debug_redacts() {
        let secret = SensitiveBytes::from("hunter2");
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("7 bytes"));
    }

    proptest! {
        #[test]
        fn token_id_display_parses_back(id in any::<u64>()) {
            let token = TokenId::new(id);
            prop_assert_eq!(token.to_string().parse::<TokenId>().unwrap(), token);
        }
    }
}
