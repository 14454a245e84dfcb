use anyhow::{Context, Result};
use clap::{App, Arg, ArgMatches};
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use std::str::FromStr;

use kvstore_bench::chain::network::NetworkType;
use kvstore_bench::chain::types::parse_address;
use kvstore_bench::config::{parse_iterations, BenchConfig};
use kvstore_bench::metrics::MetricsStorage;
use kvstore_bench::tools::benchmark_suite::{GasPriceMode, MeasureOptions};
use kvstore_bench::{prepare_client, run_suite};

fn cli() -> App<'static, 'static> {
    App::new("kvstore-bench")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Measures gas cost and latency of the KeyValueStore contract calls")
        .arg(Arg::with_name("network")
            .long("network")
            .takes_value(true)
            .help("development, goerli, sepolia, or an http(s) RPC URL"))
        .arg(Arg::with_name("artifact")
            .long("artifact")
            .takes_value(true)
            .help("Truffle build artifact to deploy from"))
        .arg(Arg::with_name("contract")
            .long("contract")
            .takes_value(true)
            .help("Attach to an already deployed instance"))
        .arg(Arg::with_name("reuse-deployment")
            .long("reuse-deployment")
            .help("Attach to the address the artifact records for this network"))
        .arg(Arg::with_name("from")
            .long("from")
            .takes_value(true)
            .help("Sending account (defaults to the node's first account)"))
        .arg(Arg::with_name("gas-price-mode")
            .long("gas-price-mode")
            .takes_value(true)
            .possible_values(&["fixed", "requery"])
            .help("Query the gas price once per pass or before every call"))
        .arg(Arg::with_name("measure")
            .long("measure")
            .takes_value(true)
            .help("Comma separated metrics to log: gas, latency"))
        .arg(Arg::with_name("iterations")
            .long("iterations")
            .takes_value(true)
            .help("Passes over the Write/Read/Delete/sendEther sequence"))
        .arg(Arg::with_name("id")
            .long("id")
            .takes_value(true)
            .multiple(true)
            .number_of_values(1)
            .help("Identifier passed to Write (repeatable)"))
        .arg(Arg::with_name("scalar-id")
            .long("scalar-id")
            .requires("id")
            .help("Pass the identifier as a single string instead of a list"))
        .arg(Arg::with_name("output")
            .long("output")
            .takes_value(true)
            .help("Write all measurements to this JSON file"))
}

fn apply_overrides(config: &mut BenchConfig, matches: &ArgMatches) -> Result<()> {
    if let Some(network) = matches.value_of("network") {
        config.chain.network_type = NetworkType::from_str(network)?;
    }
    if let Some(artifact) = matches.value_of("artifact") {
        config.artifact_path = PathBuf::from(artifact);
    }
    if let Some(contract) = matches.value_of("contract") {
        config.contract_address = Some(parse_address(contract).context("--contract")?);
    }
    if matches.is_present("reuse-deployment") {
        config.reuse_deployment = true;
    }
    if let Some(from) = matches.value_of("from") {
        config.sender = Some(parse_address(from).context("--from")?);
    }
    if let Some(mode) = matches.value_of("gas-price-mode") {
        config.options.gas_price_mode = GasPriceMode::from_str(mode)?;
    }
    if let Some(measure) = matches.value_of("measure") {
        config.options.measure = MeasureOptions::from_str(measure)?;
    }
    if let Some(iterations) = matches.value_of("iterations") {
        config.options.iterations = parse_iterations(iterations)?;
    }
    if let Some(ids) = matches.values_of("id") {
        config.set_ids(ids.map(String::from).collect(), matches.is_present("scalar-id"))?;
    }
    if let Some(output) = matches.value_of("output") {
        config.output_path = Some(PathBuf::from(output));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables if present
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    let mut config = BenchConfig::from_env()?;
    apply_overrides(&mut config, &matches)?;
    config.log_summary()?;

    let client = prepare_client(&config).await?;

    let mut storage = MetricsStorage::new();
    let session = format!("kvstore_{}", config.chain.network_type);
    let benchmark = run_suite(&client, &config.args, &config.options, &session, &mut storage).await?;

    benchmark.print_summary();
    if config.options.iterations > 1 {
        storage.print_summary();
    }

    if let Some(path) = &config.output_path {
        storage.save_to_json_file(path)?;
        info!("Measurements written to {}", path.display());
    }

    Ok(())
}
