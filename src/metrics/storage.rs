use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::measurement::{format_units, Measurement, ETHER_DECIMALS};
use super::performance::SequenceBenchmark;
use crate::chain::contract::Operation;

/// Raw measurements and session summaries collected during a run.
#[derive(Debug, Default)]
pub struct MetricsStorage {
    measurements: Vec<Measurement>,
    benchmarks: Vec<SequenceBenchmark>,
}

impl MetricsStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_measurement(&mut self, measurement: Measurement) {
        self.measurements.push(measurement);
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn add_benchmark(&mut self, benchmark: SequenceBenchmark) {
        self.benchmarks.push(benchmark);
    }

    pub fn benchmarks(&self) -> &[SequenceBenchmark] {
        &self.benchmarks
    }

    /// Average gas estimate, cost and latency per operation.
    pub fn get_average_metrics_by_operation(&self) -> BTreeMap<Operation, serde_json::Value> {
        let mut groups: BTreeMap<Operation, Vec<&Measurement>> = BTreeMap::new();
        for measurement in &self.measurements {
            groups.entry(measurement.operation).or_default().push(measurement);
        }

        groups.into_iter()
            .map(|(operation, samples)| {
                let count = samples.len() as f64;
                let avg_gas = samples.iter().map(|m| m.gas_estimate as f64).sum::<f64>() / count;
                let avg_latency_ms = samples.iter()
                    .map(|m| m.elapsed().as_secs_f64() * 1000.0)
                    .sum::<f64>() / count;
                let total_wei = samples.iter()
                    .fold(0u128, |acc, m| acc.saturating_add(m.cost.wei()));
                let avg_wei = total_wei / samples.len() as u128;

                (operation, serde_json::json!({
                    "sample_count": samples.len(),
                    "avg_gas_estimate": avg_gas,
                    "avg_cost_ether": format_units(avg_wei, ETHER_DECIMALS),
                    "avg_latency_ms": avg_latency_ms,
                }))
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "benchmarks": self.benchmarks.iter().map(|b| b.to_json()).collect::<Vec<_>>(),
            "measurements": self.measurements.iter().map(|m| m.to_json()).collect::<Vec<_>>(),
        })
    }

    pub fn save_to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn print_summary(&self) {
        let averages = self.get_average_metrics_by_operation();

        println!("\n=== PER-OPERATION AVERAGES ===");
        for (operation, stats) in averages {
            println!("\nOperation: {}", operation);
            println!("Sample Count: {}", stats["sample_count"]);
            println!("Average Gas Estimate: {:.0}", stats["avg_gas_estimate"].as_f64().unwrap_or_default());
            println!("Average Cost: {} ETH", stats["avg_cost_ether"].as_str().unwrap_or_default());
            println!("Average Latency: {:.2} ms", stats["avg_latency_ms"].as_f64().unwrap_or_default());
        }
        println!("\n==============================");
    }
}
