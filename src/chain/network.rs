use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::str::FromStr;

use crate::config::{
    DEFAULT_DEV_HOST, DEFAULT_DEV_PORT, DEFAULT_RECEIPT_POLL_ATTEMPTS,
    DEFAULT_RECEIPT_POLL_INTERVAL_MS, DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_SOLC_VERSION,
};

/// Networks the benchmark knows how to reach.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NetworkType {
    /// Local development node (`truffle develop`, ganache, anvil...)
    Development,
    /// Goerli testnet through Infura
    Goerli,
    /// Sepolia testnet through Infura
    Sepolia,
    /// Any other node reachable at the given URL
    Custom(String),
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkType::Development => write!(f, "development"),
            NetworkType::Goerli => write!(f, "goerli"),
            NetworkType::Sepolia => write!(f, "sepolia"),
            NetworkType::Custom(url) => write!(f, "custom({})", url),
        }
    }
}

impl FromStr for NetworkType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(NetworkType::Development),
            "goerli" => Ok(NetworkType::Goerli),
            "sepolia" => Ok(NetworkType::Sepolia),
            _ if s.starts_with("http://") || s.starts_with("https://") => {
                Ok(NetworkType::Custom(s.to_string()))
            }
            _ => Err(anyhow!("Unknown network type: {}", s)),
        }
    }
}

impl NetworkType {
    /// Public testnets reached through a hosted provider.
    pub fn is_remote(&self) -> bool {
        matches!(self, NetworkType::Goerli | NetworkType::Sepolia)
    }

    fn infura_subdomain(&self) -> Option<&'static str> {
        match self {
            NetworkType::Goerli => Some("goerli"),
            NetworkType::Sepolia => Some("sepolia"),
            _ => None,
        }
    }
}

/// Network id the node is expected to report through `net_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkId {
    Any,
    Exact(u64),
}

impl FromStr for NetworkId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "*" => Ok(NetworkId::Any),
            other => other
                .parse::<u64>()
                .map(NetworkId::Exact)
                .map_err(|e| anyhow!("Invalid network id {:?}: {}", other, e)),
        }
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkId::Any => write!(f, "*"),
            NetworkId::Exact(id) => write!(f, "{}", id),
        }
    }
}

/// Configuration for the network the benchmark runs against
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// The type of network
    pub network_type: NetworkType,
    /// Expected network id
    pub network_id: NetworkId,
    /// Compiler version the contract artifact was built with
    pub solc_version: String,
    /// Additional parameters (host, port, credentials, timeouts)
    pub params: HashMap<String, String>,
}

impl ChainConfig {
    pub fn new(network_type: NetworkType) -> Self {
        Self {
            network_type,
            network_id: NetworkId::Any,
            solc_version: DEFAULT_SOLC_VERSION.to_string(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_network_id(mut self, network_id: NetworkId) -> Self {
        self.network_id = network_id;
        self
    }

    pub fn get_host(&self) -> &str {
        self.params.get("host").map(String::as_str).unwrap_or(DEFAULT_DEV_HOST)
    }

    pub fn get_port(&self) -> u16 {
        self.params.get("port")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_DEV_PORT)
    }

    /// Resolves the JSON-RPC endpoint for the configured network.
    pub fn get_rpc_url(&self) -> Result<String> {
        match &self.network_type {
            NetworkType::Development => Ok(format!("http://{}:{}", self.get_host(), self.get_port())),
            NetworkType::Custom(url) => Ok(url.clone()),
            remote => {
                let key = self.params.get("infura_api_key")
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| anyhow!("Network {} requires INFURA_API_KEY to be set", remote))?;
                let subdomain = remote.infura_subdomain()
                    .ok_or_else(|| anyhow!("No hosted endpoint known for {}", remote))?;
                Ok(format!("https://{}.infura.io/v3/{}", subdomain, key))
            }
        }
    }

    pub fn get_rpc_timeout_secs(&self) -> u64 {
        self.params.get("rpc_timeout_secs")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RPC_TIMEOUT_SECS)
    }

    pub fn get_receipt_poll_attempts(&self) -> u32 {
        self.params.get("receipt_poll_attempts")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RECEIPT_POLL_ATTEMPTS)
    }

    pub fn get_receipt_poll_interval_ms(&self) -> u64 {
        self.params.get("receipt_poll_interval_ms")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RECEIPT_POLL_INTERVAL_MS)
    }

    /// Checks the id reported by the node against the configured one.
    pub fn check_network_id(&self, reported: &str) -> Result<()> {
        match self.network_id {
            NetworkId::Any => Ok(()),
            NetworkId::Exact(expected) => {
                let actual = reported.trim().parse::<u64>()
                    .map_err(|e| anyhow!("Node reported unparsable network id {:?}: {}", reported, e))?;
                if actual == expected {
                    Ok(())
                } else {
                    Err(anyhow!("Connected to network {} but configuration expects {}", actual, expected))
                }
            }
        }
    }
}
