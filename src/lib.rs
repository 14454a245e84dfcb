pub mod chain;
pub mod config;
pub mod error;
pub mod metrics;
pub mod tools;

#[cfg(test)]
pub mod tests;

pub use chain::{BenchArgs, BenchClient, Operation};
pub use config::BenchConfig;
pub use error::BenchError;
pub use metrics::{GasCost, Measurement};
pub use tools::{prepare_client, run_benchmark, run_suite, BenchmarkOptions, GasPriceMode};
