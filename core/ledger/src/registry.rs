//! Gateway registry for resolving a ledger gateway by name.

use alloy_core::primitives::Address;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::gateway::LedgerGateway;
use chainvault_common::{Error, Result};

/// Factory function type for creating gateways.
pub type GatewayFactory = Box<dyn Fn(&Value) -> Result<Arc<dyn LedgerGateway>> + Send + Sync>;

/// Default per-request timeout for the RPC gateway.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Registry for gateway factories.
pub struct GatewayRegistry {
    factories: HashMap<String, GatewayFactory>,
}

impl GatewayRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a gateway factory.
    ///
    /// # Errors
    /// - Returns error if name is already registered
    pub fn register(&mut self, name: impl Into<String>, factory: GatewayFactory) -> Result<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(Error::Config(format!(
                "Gateway '{}' is already registered",
                name
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Resolve a gateway by name and configuration.
    ///
    /// # Errors
    /// - Gateway not registered
    /// - Configuration invalid for the gateway
    pub fn resolve(&self, name: &str, config: &Value) -> Result<Arc<dyn LedgerGateway>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::Config(format!("Gateway '{}' is not registered", name)))?;
        factory(config)
    }

    /// Get list of registered gateway names.
    pub fn gateways(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a gateway is registered.
    pub fn has_gateway(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for GatewayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn required_str<'a>(config: &'a Value, field: &str) -> Result<&'a str> {
    config
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Config(format!("RPC gateway requires '{}'", field)))
}

fn build_memory(_config: &Value) -> Result<Arc<dyn LedgerGateway>> {
    Ok(Arc::new(crate::memory::MemoryLedger::new()))
}

fn build_rpc(config: &Value) -> Result<Arc<dyn LedgerGateway>> {
    let endpoint = Url::parse(required_str(config, "rpc_url")?)
        .map_err(|e| Error::Config(format!("Invalid rpc_url: {}", e)))?;
    let contract = Address::from_str(required_str(config, "contract_address")?)
        .map_err(|e| Error::Config(format!("Invalid contract_address: {}", e)))?;
    let timeout = config
        .get("request_timeout_secs")
        .and_then(|v| v.as_u64())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

    Ok(Arc::new(crate::rpc::RpcLedger::new(endpoint, contract, timeout)?))
}

/// Create a registry with the built-in gateways.
pub fn create_default_registry() -> GatewayRegistry {
    let mut factories: HashMap<String, GatewayFactory> = HashMap::new();

    // In-process ledger (for testing)
    factories.insert("memory".to_string(), Box::new(build_memory));

    // JSON-RPC node
    factories.insert("rpc".to_string(), Box::new(build_rpc));

    GatewayRegistry { factories }
}
