use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use ethabi::{Address, Hash};
use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use crate::chain::types::{
    encode_hex, parse_address, parse_hash, parse_quantity, parse_u64, CallRequest, RawReceipt,
    TransactionReceipt,
};

/// Errors raised while talking to the node.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("node returned error {code}: {message}")]
    Node { code: i64, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RpcError {
    /// True when the node could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(e) if !e.is_decode())
    }
}

impl From<anyhow::Error> for RpcError {
    fn from(err: anyhow::Error) -> Self {
        RpcError::InvalidResponse(err.to_string())
    }
}

/// The subset of the Ethereum JSON-RPC API the benchmark needs.
#[async_trait]
pub trait EthProvider: Send + Sync {
    /// `net_version`
    async fn network_id(&self) -> Result<String, RpcError>;

    /// `eth_chainId`
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// `eth_accounts`
    async fn accounts(&self) -> Result<Vec<Address>, RpcError>;

    /// `eth_gasPrice`, in wei.
    async fn gas_price(&self) -> Result<u128, RpcError>;

    /// `eth_estimateGas`
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, RpcError>;

    /// `eth_sendTransaction`, returning the transaction hash.
    async fn send_transaction(&self, request: &CallRequest) -> Result<Hash, RpcError>;

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    async fn transaction_receipt(&self, hash: Hash) -> Result<Option<TransactionReceipt>, RpcError>;
}

/// JSON-RPC over HTTP.
#[derive(Debug)]
pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!("rpc #{} -> {} {}", id, method, params);

        let response: Value = self
            .client
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params
            }))
            .send()
            .await?
            .json()
            .await?;

        // Some nodes send `"error": null` alongside a successful result.
        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            let code = error["code"].as_i64().unwrap_or_default();
            let message = error["message"].as_str().unwrap_or("unknown error").to_string();
            debug!("rpc #{} <- {} failed: {} {}", id, method, code, message);
            return Err(RpcError::Node { code, message });
        }

        let result = response
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::InvalidResponse(format!("{} response has no result", method)))?;
        trace!("rpc #{} <- {}", id, result);

        serde_json::from_value(result)
            .map_err(|e| RpcError::InvalidResponse(format!("{}: {}", method, e)))
    }
}

#[async_trait]
impl EthProvider for HttpProvider {
    async fn network_id(&self) -> Result<String, RpcError> {
        self.request("net_version", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        Ok(parse_u64(&raw)?)
    }

    async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
        let raw: Vec<String> = self.request("eth_accounts", json!([])).await?;
        raw.iter()
            .map(|account| parse_address(account).map_err(RpcError::from))
            .collect()
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        let raw: String = self.request("eth_gasPrice", json!([])).await?;
        Ok(parse_quantity(&raw)?)
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, RpcError> {
        let raw: String = self.request("eth_estimateGas", json!([request.to_json()])).await?;
        Ok(parse_u64(&raw)?)
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<Hash, RpcError> {
        let raw: String = self.request("eth_sendTransaction", json!([request.to_json()])).await?;
        Ok(parse_hash(&raw)?)
    }

    async fn transaction_receipt(&self, hash: Hash) -> Result<Option<TransactionReceipt>, RpcError> {
        let raw: Option<RawReceipt> = self
            .request("eth_getTransactionReceipt", json!([encode_hex(hash.as_bytes())]))
            .await?;
        match raw {
            Some(receipt) => Ok(Some(TransactionReceipt::try_from(receipt)?)),
            None => Ok(None),
        }
    }
}
