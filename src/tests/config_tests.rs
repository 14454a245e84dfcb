use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::chain::contract::IdArg;
use crate::chain::network::{ChainConfig, NetworkId, NetworkType};
use crate::config::{parse_bool, parse_iterations, parse_number, BenchConfig, DEFAULT_ARTIFACT_PATH};
use crate::tools::benchmark_suite::{BenchmarkOptions, GasPriceMode, MeasureOptions};

fn config_from(vars: &[(&str, &str)]) -> Result<BenchConfig> {
    let env: HashMap<String, String> = vars.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    BenchConfig::from_lookup(|key| env.get(key).cloned())
}

#[test]
fn test_defaults_target_development_node() -> Result<()> {
    let config = config_from(&[])?;

    assert_eq!(config.chain.network_type, NetworkType::Development);
    assert_eq!(config.chain.get_rpc_url()?, "http://127.0.0.1:9545");
    assert_eq!(config.chain.network_id, NetworkId::Any);
    assert_eq!(config.chain.solc_version, "0.8.15");
    assert_eq!(config.artifact_path, PathBuf::from(DEFAULT_ARTIFACT_PATH));
    assert_eq!(config.options, BenchmarkOptions::default());
    assert_eq!(config.options.gas_price_mode, GasPriceMode::Fixed);
    assert!(config.contract_address.is_none());
    assert!(!config.reuse_deployment);
    assert!(config.output_path.is_none());
    Ok(())
}

#[test]
fn test_environment_overrides() -> Result<()> {
    let config = config_from(&[
        ("BENCH_HOST", "10.0.0.2"),
        ("BENCH_PORT", "8545"),
        ("BENCH_NETWORK_ID", "5777"),
        ("BENCH_GAS_PRICE_MODE", "requery"),
        ("BENCH_MEASURE", "latency"),
        ("BENCH_ITERATIONS", "4"),
        ("BENCH_ATTACH_GAS_PRICE", "false"),
        ("BENCH_REUSE_DEPLOYMENT", "yes"),
        ("BENCH_CONTRACT_ADDRESS", "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"),
        ("BENCH_RECEIPT_POLL_ATTEMPTS", "3"),
        ("BENCH_SENDER", ""),
    ])?;

    assert_eq!(config.chain.get_rpc_url()?, "http://10.0.0.2:8545");
    assert_eq!(config.chain.network_id, NetworkId::Exact(5777));
    assert_eq!(config.chain.get_receipt_poll_attempts(), 3);
    assert_eq!(parse_number::<u16>(" 8545 ")?, 8545);
    assert_eq!(config.options.gas_price_mode, GasPriceMode::Requery);
    assert_eq!(config.options.measure, MeasureOptions { gas: false, latency: true });
    assert_eq!(config.options.iterations, 4);
    assert!(!config.options.attach_gas_price);
    assert!(config.reuse_deployment);
    assert!(config.contract_address.is_some());
    assert!(config.sender.is_none());
    Ok(())
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(config_from(&[("BENCH_GAS_PRICE_MODE", "sometimes")]).is_err());
    assert!(config_from(&[("BENCH_MEASURE", "gas,throughput")]).is_err());
    assert!(config_from(&[("BENCH_ITERATIONS", "0")]).is_err());
    assert!(config_from(&[("BENCH_NETWORK", "mainnet")]).is_err());
    assert!(config_from(&[("BENCH_CONTRACT_ADDRESS", "0x1234")]).is_err());
    assert!(config_from(&[("BENCH_NETWORK_ID", "any")]).is_err());
    assert!(config_from(&[("BENCH_PORT", "85450")]).is_err());
    assert!(config_from(&[("BENCH_RPC_TIMEOUT_SECS", "ten")]).is_err());
    assert!(config_from(&[("BENCH_RECEIPT_POLL_ATTEMPTS", "-3")]).is_err());
    assert!(config_from(&[("BENCH_RECEIPT_POLL_INTERVAL_MS", "0.5")]).is_err());
    assert!(parse_number::<u16>("65536").is_err());
    assert!(parse_bool("maybe").is_err());
    assert!(parse_iterations("-1").is_err());
}

#[test]
fn test_remote_networks_need_credentials() -> Result<()> {
    let config = config_from(&[("BENCH_NETWORK", "sepolia")])?;
    assert!(config.chain.network_type.is_remote());
    assert!(config.chain.get_rpc_url().is_err());

    let config = config_from(&[("BENCH_NETWORK", "goerli"), ("INFURA_API_KEY", "abc123")])?;
    assert_eq!(config.chain.get_rpc_url()?, "https://goerli.infura.io/v3/abc123");

    let config = config_from(&[("BENCH_NETWORK", "http://node.internal:8545")])?;
    assert_eq!(config.chain.network_type, NetworkType::Custom("http://node.internal:8545".to_string()));
    assert_eq!(config.chain.get_rpc_url()?, "http://node.internal:8545");
    Ok(())
}

#[test]
fn test_network_id_check() -> Result<()> {
    let any = ChainConfig::new(NetworkType::Development);
    assert!(any.check_network_id("1").is_ok());
    assert!(any.check_network_id("5777").is_ok());

    let exact = any.with_network_id(NetworkId::from_str("5777")?);
    assert!(exact.check_network_id("5777").is_ok());
    assert!(exact.check_network_id("1").is_err());
    assert!(exact.check_network_id("not-a-number").is_err());
    Ok(())
}

#[test]
fn test_measure_options_parsing() -> Result<()> {
    assert_eq!(MeasureOptions::from_str("gas")?, MeasureOptions { gas: true, latency: false });
    assert_eq!(MeasureOptions::from_str("gas, latency")?, MeasureOptions::default());
    assert_eq!(MeasureOptions::from_str("all")?, MeasureOptions::default());
    assert_eq!(MeasureOptions::from_str("")?, MeasureOptions { gas: false, latency: false });
    Ok(())
}

#[test]
fn test_set_ids() -> Result<()> {
    let mut config = config_from(&[])?;
    assert_eq!(config.args.id, IdArg::List(vec!["12345678".to_string()]));

    config.set_ids(vec!["a".to_string(), "b".to_string()], false)?;
    assert_eq!(config.args.id, IdArg::List(vec!["a".to_string(), "b".to_string()]));

    config.set_ids(vec!["solo".to_string()], true)?;
    assert_eq!(config.args.id, IdArg::Single("solo".to_string()));

    assert!(config.set_ids(vec!["a".to_string(), "b".to_string()], true).is_err());
    Ok(())
}
