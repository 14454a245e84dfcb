pub mod measurement;
pub mod performance;
pub mod storage;

pub use measurement::{format_latency, format_units, GasCost, Measurement};
pub use performance::{OperationStats, SequenceBenchmark};
pub use storage::MetricsStorage;
