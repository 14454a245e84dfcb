//! Benchmark suite for the KeyValueStore contract
//!
//! Issues `Write`, `Read`, `Delete` and `sendEther` in that order against one
//! contract instance and reports the gas estimate, derived cost and
//! send-to-confirmation latency of every call.
//!
//! # Usage Example
//!
//! ```bash
//! # Deploy a fresh instance on the development node and benchmark it:
//! cargo run --release -- --artifact build/contracts/KeyValueStore.json
//!
//! # Re-query the gas price before each call, ten passes, JSON output:
//! cargo run --release -- --gas-price-mode requery --iterations 10 --output results.json
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::chain::client::{BenchClient, ReceiptPolling};
use crate::chain::contract::{BenchArgs, ContractArtifact, KeyValueStore, Operation};
use crate::chain::rpc::{EthProvider, HttpProvider};
use crate::chain::types::encode_hex;
use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::metrics::measurement::{format_latency, Measurement};
use crate::metrics::performance::SequenceBenchmark;
use crate::metrics::storage::MetricsStorage;

/// When the gas price is read from the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPriceMode {
    /// Once at the start of each pass over the sequence
    Fixed,
    /// Before every call
    Requery,
}

impl std::fmt::Display for GasPriceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GasPriceMode::Fixed => write!(f, "fixed"),
            GasPriceMode::Requery => write!(f, "requery"),
        }
    }
}

impl FromStr for GasPriceMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" | "once" => Ok(GasPriceMode::Fixed),
            "requery" | "per-call" => Ok(GasPriceMode::Requery),
            other => Err(anyhow!("Unknown gas price mode: {}", other)),
        }
    }
}

/// Which metrics are logged for each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureOptions {
    pub gas: bool,
    pub latency: bool,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self { gas: true, latency: true }
    }
}

impl FromStr for MeasureOptions {
    type Err = anyhow::Error;

    /// Comma separated list of `gas`, `latency`, or `all`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut measure = MeasureOptions { gas: false, latency: false };
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "gas" => measure.gas = true,
                "latency" => measure.latency = true,
                "all" => measure = MeasureOptions::default(),
                other => return Err(anyhow!("Unknown metric: {}", other)),
            }
        }
        Ok(measure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkOptions {
    pub measure: MeasureOptions,
    pub gas_price_mode: GasPriceMode,
    /// Send the queried gas price with each transaction instead of letting the
    /// node pick one.
    pub attach_gas_price: bool,
    /// Passes over the sequence made by `run_suite`.
    pub iterations: u32,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            measure: MeasureOptions::default(),
            gas_price_mode: GasPriceMode::Fixed,
            attach_gas_price: true,
            iterations: 1,
        }
    }
}

/// Connects to the configured node and deploys or attaches to the contract.
pub async fn prepare_client(config: &BenchConfig) -> Result<BenchClient> {
    let rpc_url = config.chain.get_rpc_url()?;
    let timeout = Duration::from_secs(config.chain.get_rpc_timeout_secs());
    let provider: Arc<dyn EthProvider> = Arc::new(HttpProvider::new(&rpc_url, timeout)?);
    prepare_client_with(provider, config, &rpc_url).await
}

/// Same as [`prepare_client`] over an existing provider. `rpc_url` only labels
/// log lines and errors.
pub async fn prepare_client_with(
    provider: Arc<dyn EthProvider>,
    config: &BenchConfig,
    rpc_url: &str,
) -> Result<BenchClient> {
    let polling = ReceiptPolling::new(
        config.chain.get_receipt_poll_attempts(),
        Duration::from_millis(config.chain.get_receipt_poll_interval_ms()),
    );

    let network_id = provider.network_id().await
        .map_err(BenchError::Connectivity)
        .with_context(|| format!("Failed to query {}", rpc_url))?;
    config.chain.check_network_id(&network_id)?;
    match provider.chain_id().await {
        Ok(chain_id) => info!("Connected to network ID {} (chain id {}) at {}", network_id, chain_id, rpc_url),
        Err(e) => {
            warn!("eth_chainId unavailable: {}", e);
            info!("Connected to network ID {} at {}", network_id, rpc_url);
        }
    }
    match provider.gas_price().await {
        Ok(price) => info!("Current gas price: {} wei", price),
        Err(e) => warn!("eth_gasPrice unavailable: {}", e),
    }

    let from = BenchClient::resolve_sender(provider.as_ref(), config.sender).await?;
    info!("Sending from {}", encode_hex(from.as_bytes()));

    if let Some(address) = config.contract_address {
        info!("Attaching to KeyValueStore at {}", encode_hex(address.as_bytes()));
        return Ok(BenchClient::new(provider, KeyValueStore::at(address), from, polling));
    }

    let artifact = ContractArtifact::load(&config.artifact_path)?;
    if config.reuse_deployment {
        match artifact.deployed_address(&network_id)? {
            Some(address) => {
                info!("Attaching to KeyValueStore recorded for network {} at {}", network_id, encode_hex(address.as_bytes()));
                return Ok(BenchClient::new(provider, KeyValueStore::at(address), from, polling));
            }
            None => warn!("Artifact has no deployment for network {}, deploying a new instance", network_id),
        }
    }

    let client = BenchClient::deploy(provider, from, artifact.bytecode()?, polling).await?;
    Ok(client)
}

/// Runs the four calls once, in order, stopping at the first failure.
pub async fn run_benchmark(
    client: &BenchClient,
    args: &BenchArgs,
    options: &BenchmarkOptions,
) -> Result<Vec<Measurement>, BenchError> {
    let fixed_price = match options.gas_price_mode {
        GasPriceMode::Fixed => {
            let price = client.gas_price().await?;
            info!("Gas price: {} wei", price);
            Some(price)
        }
        GasPriceMode::Requery => None,
    };

    let mut measurements = Vec::with_capacity(Operation::SEQUENCE.len());
    for operation in Operation::SEQUENCE {
        let gas_price = match fixed_price {
            Some(price) => price,
            None => client.gas_price().await?,
        };
        let measurement = measure_operation(client, args, operation, gas_price, options).await?;
        log_measurement(&measurement, options);
        measurements.push(measurement);
    }
    Ok(measurements)
}

/// Estimates, submits and confirms a single call.
async fn measure_operation(
    client: &BenchClient,
    args: &BenchArgs,
    operation: Operation,
    gas_price: u128,
    options: &BenchmarkOptions,
) -> Result<Measurement, BenchError> {
    let mut request = client.request(args, operation);
    let gas_estimate = client.estimate_gas(operation, &request).await?;
    if options.measure.gas {
        info!("Gas estimate for {} transaction: {}", operation, gas_estimate);
    }

    request.gas = Some(gas_estimate);
    if options.attach_gas_price {
        request.gas_price = Some(gas_price);
    }

    let sent_at_utc = Utc::now();
    let sent_at = Instant::now();
    let tx_hash = client.send_transaction(operation, &request).await?;
    let receipt = client.wait_for_receipt(operation, tx_hash).await?;
    let confirmed_at = Instant::now();

    if !receipt.is_success() {
        return Err(BenchError::Reverted {
            operation: operation.to_string(),
            tx_hash: encode_hex(tx_hash.as_bytes()),
        });
    }

    Ok(Measurement::new(operation, gas_estimate, gas_price, sent_at_utc, sent_at, confirmed_at, &receipt))
}

fn log_measurement(measurement: &Measurement, options: &BenchmarkOptions) {
    if options.measure.gas {
        info!(
            "Cost of the {} transaction: {} ETH ({} gwei at {} wei/gas)",
            measurement.operation,
            measurement.cost.ether_string(),
            measurement.cost.gwei_string(),
            measurement.gas_price
        );
    }
    if options.measure.latency {
        info!(
            "{} transaction network latency: {}",
            measurement.operation,
            format_latency(measurement.elapsed())
        );
    }
}

/// Runs the sequence `options.iterations` times, collecting every measurement
/// into `storage`. The first failure aborts the whole suite.
pub async fn run_suite(
    client: &BenchClient,
    args: &BenchArgs,
    options: &BenchmarkOptions,
    name: &str,
    storage: &mut MetricsStorage,
) -> Result<SequenceBenchmark, BenchError> {
    let mut benchmark = SequenceBenchmark::new(name);
    benchmark
        .add_config("contract", &encode_hex(client.contract().address().as_bytes()))
        .add_config("sender", &encode_hex(client.sender().as_bytes()))
        .add_config("gas_price_mode", &options.gas_price_mode.to_string())
        .add_config("attach_gas_price", &options.attach_gas_price.to_string());

    let iterations = options.iterations.max(1);
    for iteration in 1..=iterations {
        if iterations > 1 {
            info!("Iteration {} of {}", iteration, iterations);
        }
        for measurement in run_benchmark(client, args, options).await? {
            benchmark.record(&measurement);
            storage.add_measurement(measurement);
        }
        benchmark.complete_iteration();
    }

    benchmark.end();
    storage.add_benchmark(benchmark.clone());
    Ok(benchmark)
}
