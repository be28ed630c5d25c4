//! Client configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `CHAINVAULT_*` environment variables. Nothing deployment-specific is
//! compiled in.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::wallet::WalletAccount;
use chainvault_common::{Error, Result};
use chainvault_crypto::KdfParams;
use chainvault_ledger::Address;

/// Configuration file name inside the config directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Environment variable overriding `rpc_url`.
pub const ENV_RPC_URL: &str = "CHAINVAULT_RPC_URL";
/// Environment variable overriding `contract_address`.
pub const ENV_CONTRACT: &str = "CHAINVAULT_CONTRACT";
/// Environment variable overriding `account`.
pub const ENV_ACCOUNT: &str = "CHAINVAULT_ACCOUNT";
/// Environment variable overriding `confirmation_timeout_secs`.
pub const ENV_CONFIRMATION_TIMEOUT: &str = "CHAINVAULT_CONFIRMATION_TIMEOUT";
/// Environment variable overriding `gateway`.
pub const ENV_GATEWAY: &str = "CHAINVAULT_GATEWAY";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Gateway type ("rpc" or "memory").
    pub gateway: String,
    /// JSON-RPC endpoint of the ledger node.
    pub rpc_url: String,
    /// Address of the deployed vault contract.
    pub contract_address: Option<String>,
    /// Account that signs transactions. Without it only collection
    /// metadata can be read.
    pub account: Option<String>,
    /// Argon2id cost parameters.
    pub kdf_params: KdfParams,
    /// How long to wait for a submitted transaction to confirm.
    pub confirmation_timeout_secs: u64,
    /// Delay between receipt polls.
    pub poll_interval_ms: u64,
    /// Timeout for a single JSON-RPC request.
    pub request_timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            gateway: "rpc".to_string(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            contract_address: None,
            account: None,
            kdf_params: KdfParams::default(),
            confirmation_timeout_secs: 120,
            poll_interval_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

impl VaultConfig {
    /// Default config file location (`<config dir>/chainvault/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chainvault").join(CONFIG_FILENAME))
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Some(contract) = lookup(ENV_CONTRACT) {
            self.contract_address = Some(contract);
        }
        if let Some(account) = lookup(ENV_ACCOUNT) {
            self.account = Some(account);
        }
        if let Some(gateway) = lookup(ENV_GATEWAY) {
            self.gateway = gateway;
        }
        if let Some(timeout) = lookup(ENV_CONFIRMATION_TIMEOUT) {
            self.confirmation_timeout_secs = timeout.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a number of seconds, got '{}'",
                    ENV_CONFIRMATION_TIMEOUT, timeout
                ))
            })?;
        }
        Ok(())
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    /// - RPC gateway without a parseable endpoint or contract address
    /// - Malformed account address
    /// - Zero confirmation timeout or poll interval
    pub fn validate(&self) -> Result<()> {
        if self.gateway == "rpc" {
            Url::parse(&self.rpc_url)
                .map_err(|e| Error::Config(format!("Invalid rpc_url '{}': {}", self.rpc_url, e)))?;
            if self.contract_address.is_none() {
                return Err(Error::Config(format!(
                    "contract_address is required (set {})",
                    ENV_CONTRACT
                )));
            }
        }
        self.contract()?;
        self.wallet()?;

        if self.confirmation_timeout_secs == 0 {
            return Err(Error::Config(
                "confirmation_timeout_secs must be positive".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Parsed contract address; the zero address when none is configured.
    pub fn contract(&self) -> Result<Address> {
        match &self.contract_address {
            Some(text) => Address::from_str(text.trim())
                .map_err(|e| Error::Config(format!("Invalid contract_address '{}': {}", text, e))),
            None => Ok(Address::ZERO),
        }
    }

    /// Configured signing account, if any.
    pub fn wallet(&self) -> Result<Option<WalletAccount>> {
        self.account
            .as_deref()
            .map(WalletAccount::from_str)
            .transpose()
    }

    /// Confirmation timeout as a `Duration`.
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// Receipt poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settings handed to the gateway registry.
    pub fn gateway_config(&self) -> serde_json::Value {
        serde_json::json!({
            "rpc_url": self.rpc_url,
            "contract_address": self.contract_address,
            "request_timeout_secs": self.request_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_defaults_need_contract() {
        let config = VaultConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_RPC_URL, "https://rpc.example.org"),
            (ENV_CONTRACT, CONTRACT),
            (ENV_ACCOUNT, ACCOUNT),
            (ENV_CONFIRMATION_TIMEOUT, "45"),
        ]
        .into_iter()
        .collect();

        let mut config = VaultConfig::default();
        config
            .apply_env_from(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.rpc_url, "https://rpc.example.org");
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(45));
        assert!(config.validate().is_ok());
        assert!(config.wallet().unwrap().is_some());
    }

    #[test]
    fn test_bad_timeout_env() {
        let mut config = VaultConfig::default();
        let result = config.apply_env_from(|name| {
            (name == ENV_CONFIRMATION_TIMEOUT).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_contract_rejected() {
        let config = VaultConfig {
            contract_address: Some("0x1234".to_string()),
            ..VaultConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_memory_gateway_needs_no_contract() {
        let config = VaultConfig {
            gateway: "memory".to_string(),
            ..VaultConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.contract().unwrap(), Address::ZERO);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);

        let config = VaultConfig {
            contract_address: Some(CONTRACT.to_string()),
            kdf_params: KdfParams::moderate(),
            ..VaultConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(VaultConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = VaultConfig::from_json(r#"{ "rpc_url": "http://node:8545" }"#).unwrap();
        assert_eq!(config.rpc_url, "http://node:8545");
        assert_eq!(config.confirmation_timeout_secs, 120);
        assert_eq!(config.gateway, "rpc");
    }
}
