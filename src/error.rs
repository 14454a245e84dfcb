use thiserror::Error;

use crate::chain::rpc::RpcError;

/// Every way a benchmark run can fail. All of them abort the run.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("could not reach node: {0}")]
    Connectivity(#[source] RpcError),

    #[error("gas estimation failed for {operation}: {source}")]
    Estimation {
        operation: String,
        #[source]
        source: RpcError,
    },

    #[error("{operation} rejected by node: {source}")]
    Rejected {
        operation: String,
        #[source]
        source: RpcError,
    },

    #[error("{operation} not confirmed after {attempts} receipt polls (tx {tx_hash})")]
    Unconfirmed {
        operation: String,
        tx_hash: String,
        attempts: u32,
    },

    #[error("{operation} reverted in tx {tx_hash}")]
    Reverted { operation: String, tx_hash: String },

    #[error("node exposes no accounts to send from")]
    NoSenderAccount,

    #[error("deployment receipt for tx {0} has no contract address")]
    MissingContractAddress(String),
}

impl BenchError {
    /// Transport failures are always connectivity errors; anything else is
    /// attributed to the step that failed.
    pub fn classify(err: RpcError, step: impl FnOnce(RpcError) -> BenchError) -> BenchError {
        if err.is_transport() {
            BenchError::Connectivity(err)
        } else {
            step(err)
        }
    }
}
