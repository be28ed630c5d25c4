//! Signing account used for ledger writes.

use std::fmt;
use std::str::FromStr;

use chainvault_common::{Error, Result};
use chainvault_ledger::Address;

/// Account the node signs transactions with.
///
/// Only the address is held here; keys stay with the node or wallet
/// software behind the RPC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletAccount {
    address: Address,
}

impl WalletAccount {
    /// Wrap an address.
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Account address.
    pub fn address(&self) -> Address {
        self.address
    }
}

impl From<Address> for WalletAccount {
    fn from(address: Address) -> Self {
        Self::new(address)
    }
}

impl FromStr for WalletAccount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let address = Address::from_str(s.trim())
            .map_err(|e| Error::Config(format!("Invalid account address '{}': {}", s, e)))?;
        Ok(Self::new(address))
    }
}

impl fmt::Display for WalletAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}
