pub mod client;
pub mod contract;
pub mod network;
pub mod rpc;
pub mod types;

pub use client::{BenchClient, ReceiptPolling};
pub use contract::{BenchArgs, ContractArtifact, IdArg, KeyValueStore, Operation};
pub use network::{ChainConfig, NetworkId, NetworkType};
pub use rpc::{EthProvider, HttpProvider, RpcError};
pub use types::{CallRequest, TransactionReceipt};
