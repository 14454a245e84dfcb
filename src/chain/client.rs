use std::sync::Arc;
use std::time::Duration;

use ethabi::{Address, Hash};
use log::{debug, info};
use tokio::time::sleep;

use crate::chain::contract::{BenchArgs, KeyValueStore, Operation, CONTRACT_NAME};
use crate::chain::rpc::EthProvider;
use crate::chain::types::{encode_hex, CallRequest, TransactionReceipt};
use crate::error::BenchError;

/// How long to wait for a submitted transaction to be mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolling {
    pub attempts: u32,
    pub interval: Duration,
}

impl ReceiptPolling {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            interval,
        }
    }
}

/// Node connection, sending account and contract instance for one benchmark.
#[derive(Clone)]
pub struct BenchClient {
    provider: Arc<dyn EthProvider>,
    contract: KeyValueStore,
    from: Address,
    polling: ReceiptPolling,
}

impl BenchClient {
    pub fn new(
        provider: Arc<dyn EthProvider>,
        contract: KeyValueStore,
        from: Address,
        polling: ReceiptPolling,
    ) -> Self {
        Self { provider, contract, from, polling }
    }

    /// Deploys `bytecode` from `from` and returns a client bound to the new instance.
    pub async fn deploy(
        provider: Arc<dyn EthProvider>,
        from: Address,
        bytecode: Vec<u8>,
        polling: ReceiptPolling,
    ) -> Result<Self, BenchError> {
        let label = format!("{} deployment", CONTRACT_NAME);
        let mut request = CallRequest {
            from: Some(from),
            to: None,
            data: bytecode,
            ..Default::default()
        };
        let gas = estimate(provider.as_ref(), &label, &request).await?;
        request.gas = Some(gas);

        let tx_hash = send(provider.as_ref(), &label, &request).await?;
        let receipt = wait_for_receipt(provider.as_ref(), polling, &label, tx_hash).await?;
        if !receipt.is_success() {
            return Err(BenchError::Reverted {
                operation: label,
                tx_hash: encode_hex(tx_hash.as_bytes()),
            });
        }
        let address = receipt
            .contract_address
            .ok_or_else(|| BenchError::MissingContractAddress(encode_hex(tx_hash.as_bytes())))?;

        info!(
            "Deployed {} at {} (tx {}, gas estimate {})",
            CONTRACT_NAME,
            encode_hex(address.as_bytes()),
            encode_hex(tx_hash.as_bytes()),
            gas
        );
        Ok(Self::new(provider, KeyValueStore::at(address), from, polling))
    }

    /// The configured sender, or the node's first managed account.
    pub async fn resolve_sender(
        provider: &dyn EthProvider,
        configured: Option<Address>,
    ) -> Result<Address, BenchError> {
        if let Some(address) = configured {
            return Ok(address);
        }
        let accounts = provider
            .accounts()
            .await
            .map_err(|e| BenchError::classify(e, |source| BenchError::Rejected {
                operation: "eth_accounts".to_string(),
                source,
            }))?;
        accounts.first().copied().ok_or(BenchError::NoSenderAccount)
    }

    pub fn contract(&self) -> &KeyValueStore {
        &self.contract
    }

    pub fn sender(&self) -> Address {
        self.from
    }

    pub async fn gas_price(&self) -> Result<u128, BenchError> {
        self.provider
            .gas_price()
            .await
            .map_err(|e| BenchError::classify(e, |source| BenchError::Rejected {
                operation: "eth_gasPrice".to_string(),
                source,
            }))
    }

    /// Transaction invoking `operation` on the bound contract.
    pub fn request(&self, args: &BenchArgs, operation: Operation) -> CallRequest {
        self.contract.call(self.from, args, operation)
    }

    pub async fn estimate_gas(&self, operation: Operation, request: &CallRequest) -> Result<u64, BenchError> {
        estimate(self.provider.as_ref(), operation.method_name(), request).await
    }

    pub async fn send_transaction(&self, operation: Operation, request: &CallRequest) -> Result<Hash, BenchError> {
        send(self.provider.as_ref(), operation.method_name(), request).await
    }

    pub async fn wait_for_receipt(&self, operation: Operation, tx_hash: Hash) -> Result<TransactionReceipt, BenchError> {
        wait_for_receipt(self.provider.as_ref(), self.polling, operation.method_name(), tx_hash).await
    }
}

async fn estimate(provider: &dyn EthProvider, label: &str, request: &CallRequest) -> Result<u64, BenchError> {
    provider
        .estimate_gas(request)
        .await
        .map_err(|e| BenchError::classify(e, |source| BenchError::Estimation {
            operation: label.to_string(),
            source,
        }))
}

async fn send(provider: &dyn EthProvider, label: &str, request: &CallRequest) -> Result<Hash, BenchError> {
    provider
        .send_transaction(request)
        .await
        .map_err(|e| BenchError::classify(e, |source| BenchError::Rejected {
            operation: label.to_string(),
            source,
        }))
}

async fn wait_for_receipt(
    provider: &dyn EthProvider,
    polling: ReceiptPolling,
    label: &str,
    tx_hash: Hash,
) -> Result<TransactionReceipt, BenchError> {
    for attempt in 1..=polling.attempts {
        let receipt = provider
            .transaction_receipt(tx_hash)
            .await
            .map_err(|e| BenchError::classify(e, |source| BenchError::Rejected {
                operation: label.to_string(),
                source,
            }))?;
        if let Some(receipt) = receipt {
            return Ok(receipt);
        }
        debug!("{} receipt pending (poll {}/{})", label, attempt, polling.attempts);
        if attempt < polling.attempts {
            sleep(polling.interval).await;
        }
    }

    Err(BenchError::Unconfirmed {
        operation: label.to_string(),
        tx_hash: encode_hex(tx_hash.as_bytes()),
        attempts: polling.attempts,
    })
}
