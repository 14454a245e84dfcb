//! Per-call gas and latency measurement.

use chrono::{DateTime, Utc};
use ethabi::Hash;
use std::time::{Duration, Instant};

use crate::chain::contract::Operation;
use crate::chain::types::{encode_hex, TransactionReceipt};

pub const ETHER_DECIMALS: u32 = 18;
pub const GWEI_DECIMALS: u32 = 9;
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Monetary cost of a call, held in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GasCost {
    wei: u128,
}

impl GasCost {
    /// `gas * gas_price`, saturating at `u128::MAX`.
    pub fn new(gas: u64, gas_price: u128) -> Self {
        Self {
            wei: u128::from(gas).saturating_mul(gas_price),
        }
    }

    pub fn wei(&self) -> u128 {
        self.wei
    }

    pub fn ether(&self) -> f64 {
        self.wei as f64 / WEI_PER_ETHER as f64
    }

    /// Exact decimal rendering in ether.
    pub fn ether_string(&self) -> String {
        format_units(self.wei, ETHER_DECIMALS)
    }

    pub fn gwei_string(&self) -> String {
        format_units(self.wei, GWEI_DECIMALS)
    }
}

impl std::fmt::Display for GasCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ETH ({} gwei)", self.ether_string(), self.gwei_string())
    }
}

/// Renders `value` scaled down by `10^decimals` without losing precision.
/// Trailing fractional zeros are dropped.
pub fn format_units(value: u128, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// `HH:MM:SS.mmm`; hours keep counting past 24.
pub fn format_latency(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Outcome of one contract call.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub operation: Operation,
    pub gas_estimate: u64,
    pub gas_price: u128,
    pub cost: GasCost,
    pub sent_at_utc: DateTime<Utc>,
    sent_at: Instant,
    confirmed_at: Instant,
    pub tx_hash: Hash,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
}

impl Measurement {
    pub fn new(
        operation: Operation,
        gas_estimate: u64,
        gas_price: u128,
        sent_at_utc: DateTime<Utc>,
        sent_at: Instant,
        confirmed_at: Instant,
        receipt: &TransactionReceipt,
    ) -> Self {
        Self {
            operation,
            gas_estimate,
            gas_price,
            cost: GasCost::new(gas_estimate, gas_price),
            sent_at_utc,
            sent_at,
            // A confirmation can never be observed before the send.
            confirmed_at: confirmed_at.max(sent_at),
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        }
    }

    pub fn sent_at(&self) -> Instant {
        self.sent_at
    }

    pub fn confirmed_at(&self) -> Instant {
        self.confirmed_at
    }

    /// Send-to-confirmation latency on the monotonic clock.
    pub fn elapsed(&self) -> Duration {
        self.confirmed_at.saturating_duration_since(self.sent_at)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "operation": self.operation.method_name(),
            "gas_estimate": self.gas_estimate,
            "gas_price_wei": self.gas_price.to_string(),
            "cost_wei": self.cost.wei().to_string(),
            "cost_ether": self.cost.ether_string(),
            "cost_gwei": self.cost.gwei_string(),
            "sent_at": self.sent_at_utc.to_rfc3339(),
            "latency_ms": self.elapsed().as_secs_f64() * 1000.0,
            "latency": format_latency(self.elapsed()),
            "tx_hash": encode_hex(self.tx_hash.as_bytes()),
            "block_number": self.block_number,
            "gas_used": self.gas_used,
        })
    }
}
