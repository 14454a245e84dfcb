pub mod benchmark_suite;

pub use benchmark_suite::{
    prepare_client, prepare_client_with, run_benchmark, run_suite, BenchmarkOptions, GasPriceMode, MeasureOptions,
};
