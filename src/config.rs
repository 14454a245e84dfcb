//! Configuration for the KeyValueStore benchmark
//!
//! Defaults mirror the development network the contract is built and tested
//! against. Every value can be overridden from the environment (a `.env` file is
//! loaded by the binary) and then from the command line.

use anyhow::{anyhow, Context, Result};
use ethabi::Address;
use log::info;
use std::path::PathBuf;
use std::str::FromStr;

use crate::chain::contract::{BenchArgs, IdArg};
use crate::chain::network::{ChainConfig, NetworkId, NetworkType};
use crate::chain::types::parse_address;
use crate::tools::benchmark_suite::{BenchmarkOptions, GasPriceMode, MeasureOptions};

// --- Development network ---

pub const DEFAULT_DEV_HOST: &str = "127.0.0.1";
pub const DEFAULT_DEV_PORT: u16 = 9545;

/// Compiler the contract artifact is expected to be built with.
pub const DEFAULT_SOLC_VERSION: &str = "0.8.15";

pub const DEFAULT_ARTIFACT_PATH: &str = "build/contracts/KeyValueStore.json";

// --- Timeouts ---

pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RECEIPT_POLL_ATTEMPTS: u32 = 30;
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 500;

// --- Call fixture ---

/// One-byte ciphertext.
pub const FIXTURE_CIPHER: &str = "0x01";
pub const FIXTURE_IV: &str = "0x1234567890abcdef12345678";
pub const FIXTURE_ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
pub const FIXTURE_ID: &str = "12345678";

/// Everything needed to prepare a client and run the benchmark.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub chain: ChainConfig,
    pub artifact_path: PathBuf,
    /// Attach to this instance instead of deploying.
    pub contract_address: Option<Address>,
    /// Attach to the address the artifact records for the node's network id.
    pub reuse_deployment: bool,
    /// Sending account; the node's first account when unset.
    pub sender: Option<Address>,
    pub options: BenchmarkOptions,
    pub args: BenchArgs,
    /// Write measurements as JSON here.
    pub output_path: Option<PathBuf>,
}

impl BenchConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for unset
    /// or empty variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let network_type = match get("BENCH_NETWORK") {
            Some(name) => NetworkType::from_str(&name)?,
            None => NetworkType::Development,
        };
        let network_id = match get("BENCH_NETWORK_ID") {
            Some(id) => NetworkId::from_str(&id)?,
            None => NetworkId::Any,
        };

        let mut chain = ChainConfig::new(network_type).with_network_id(network_id);
        if let Some(version) = get("BENCH_SOLC_VERSION") {
            chain.solc_version = version;
        }
        for (var, param) in [("BENCH_HOST", "host"), ("INFURA_API_KEY", "infura_api_key")] {
            if let Some(value) = get(var) {
                chain = chain.with_param(param, &value);
            }
        }
        if let Some(port) = get("BENCH_PORT") {
            let port = parse_number::<u16>(&port).context("BENCH_PORT")?;
            chain = chain.with_param("port", &port.to_string());
        }
        if let Some(timeout) = get("BENCH_RPC_TIMEOUT_SECS") {
            let timeout = parse_number::<u64>(&timeout).context("BENCH_RPC_TIMEOUT_SECS")?;
            chain = chain.with_param("rpc_timeout_secs", &timeout.to_string());
        }
        if let Some(attempts) = get("BENCH_RECEIPT_POLL_ATTEMPTS") {
            let attempts = parse_number::<u32>(&attempts).context("BENCH_RECEIPT_POLL_ATTEMPTS")?;
            chain = chain.with_param("receipt_poll_attempts", &attempts.to_string());
        }
        if let Some(interval) = get("BENCH_RECEIPT_POLL_INTERVAL_MS") {
            let interval = parse_number::<u64>(&interval).context("BENCH_RECEIPT_POLL_INTERVAL_MS")?;
            chain = chain.with_param("receipt_poll_interval_ms", &interval.to_string());
        }

        let mut options = BenchmarkOptions::default();
        if let Some(mode) = get("BENCH_GAS_PRICE_MODE") {
            options.gas_price_mode = GasPriceMode::from_str(&mode)?;
        }
        if let Some(measure) = get("BENCH_MEASURE") {
            options.measure = MeasureOptions::from_str(&measure)?;
        }
        if let Some(attach) = get("BENCH_ATTACH_GAS_PRICE") {
            options.attach_gas_price = parse_bool(&attach)
                .with_context(|| "BENCH_ATTACH_GAS_PRICE")?;
        }
        if let Some(iterations) = get("BENCH_ITERATIONS") {
            options.iterations = parse_iterations(&iterations)?;
        }

        let contract_address = get("BENCH_CONTRACT_ADDRESS")
            .map(|a| parse_address(&a).context("BENCH_CONTRACT_ADDRESS"))
            .transpose()?;
        let sender = get("BENCH_SENDER")
            .map(|a| parse_address(&a).context("BENCH_SENDER"))
            .transpose()?;
        let reuse_deployment = get("BENCH_REUSE_DEPLOYMENT")
            .map(|v| parse_bool(&v).context("BENCH_REUSE_DEPLOYMENT"))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            chain,
            artifact_path: get("BENCH_ARTIFACT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_PATH)),
            contract_address,
            reuse_deployment,
            sender,
            options,
            args: BenchArgs::fixture()?,
            output_path: None,
        })
    }

    /// Replaces the `Write` identifier.
    pub fn set_ids(&mut self, ids: Vec<String>, scalar: bool) -> Result<()> {
        self.args.id = if scalar {
            match ids.as_slice() {
                [single] => IdArg::Single(single.clone()),
                _ => return Err(anyhow!("A scalar id takes exactly one value, got {}", ids.len())),
            }
        } else {
            IdArg::List(ids)
        };
        Ok(())
    }

    pub fn log_summary(&self) -> Result<()> {
        info!("Network:         {} ({})", self.chain.network_type, self.chain.get_rpc_url()?);
        info!("Network id:      {}", self.chain.network_id);
        info!("Compiler:        solc {}", self.chain.solc_version);
        info!("Gas price mode:  {}", self.options.gas_price_mode);
        info!("Iterations:      {}", self.options.iterations);
        Ok(())
    }
}

pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Expected a boolean, got {:?}", other)),
    }
}

/// Parses a numeric setting, rejecting values out of range for `T`.
pub fn parse_number<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>()
        .map_err(|e| anyhow!("Invalid number {:?}: {}", value, e))
}

pub fn parse_iterations(value: &str) -> Result<u32> {
    let iterations = value.trim().parse::<u32>()
        .map_err(|e| anyhow!("Invalid iteration count {:?}: {}", value, e))?;
    if iterations == 0 {
        return Err(anyhow!("Iteration count must be at least 1"));
    }
    Ok(iterations)
}
