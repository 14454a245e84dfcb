//! Aggregate statistics over repeated runs of the call sequence.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::chain::contract::Operation;
use crate::metrics::measurement::{format_units, Measurement, ETHER_DECIMALS};

/// Results for one benchmark session (one or more passes over the sequence).
#[derive(Debug, Clone, Default)]
pub struct SequenceBenchmark {
    /// Name identifying the session (e.g. "kvstore_development").
    pub name: String,
    /// Number of completed passes over the four operations.
    pub iterations: u32,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
    total_duration_ms: Option<u64>,
    /// Parameters the session ran with (network, gas price mode, ...).
    pub configuration: BTreeMap<String, String>,
    /// Statistics per contract call.
    pub operation_stats: BTreeMap<Operation, OperationStats>,
}

/// Statistics for one contract call across iterations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationStats {
    pub count: u32,
    /// Latencies in microseconds.
    pub total_latency_us: u64,
    pub min_latency_us: u64,
    pub max_latency_us: u64,
    pub total_gas: u64,
    /// Summed cost in wei.
    pub total_cost_wei: u128,
}

impl OperationStats {
    pub fn average_latency_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_latency_us as f64 / self.count as f64 / 1000.0
        }
    }

    pub fn average_gas(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_gas as f64 / self.count as f64
        }
    }
}

impl SequenceBenchmark {
    /// Creates a new benchmark and records the start time.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn add_config(&mut self, key: &str, value: &str) -> &mut Self {
        self.configuration.insert(key.to_string(), value.to_string());
        self
    }

    pub fn record(&mut self, measurement: &Measurement) -> &mut Self {
        let latency_us = u64::try_from(measurement.elapsed().as_micros()).unwrap_or(u64::MAX);
        let stats = self.operation_stats.entry(measurement.operation).or_default();
        stats.count += 1;
        stats.total_latency_us = stats.total_latency_us.saturating_add(latency_us);
        stats.total_gas = stats.total_gas.saturating_add(measurement.gas_estimate);
        stats.total_cost_wei = stats.total_cost_wei.saturating_add(measurement.cost.wei());
        if stats.count == 1 {
            stats.min_latency_us = latency_us;
            stats.max_latency_us = latency_us;
        } else {
            stats.min_latency_us = stats.min_latency_us.min(latency_us);
            stats.max_latency_us = stats.max_latency_us.max(latency_us);
        }
        self
    }

    /// Counts one completed pass over the sequence.
    pub fn complete_iteration(&mut self) -> &mut Self {
        self.iterations += 1;
        self
    }

    /// Marks the end of the session. Idempotent.
    pub fn end(&mut self) -> &mut Self {
        if self.end_time.is_none() {
            let now = Instant::now();
            self.end_time = Some(now);
            if let Some(start) = self.start_time {
                self.total_duration_ms = Some(now.duration_since(start).as_millis() as u64);
            }
        }
        self
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.total_duration_ms
    }

    pub fn get_operation_stats(&self, operation: Operation) -> Option<&OperationStats> {
        self.operation_stats.get(&operation)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let operation_summary: BTreeMap<String, serde_json::Value> = self.operation_stats.iter()
            .map(|(operation, stats)| {
                (operation.method_name().to_string(), serde_json::json!({
                    "count": stats.count,
                    "average_latency_ms": stats.average_latency_ms(),
                    "min_latency_us": stats.min_latency_us,
                    "max_latency_us": stats.max_latency_us,
                    "average_gas": stats.average_gas(),
                    "total_cost_ether": format_units(stats.total_cost_wei, ETHER_DECIMALS),
                }))
            })
            .collect();

        serde_json::json!({
            "name": self.name,
            "iterations": self.iterations,
            "total_duration_ms": self.duration_ms(),
            "configuration": self.configuration,
            "operation_stats": operation_summary,
        })
    }

    pub fn print_summary(&self) {
        println!("\n--- KeyValueStore Benchmark Summary ---");
        println!("Session:         {}", self.name);
        println!("Iterations:      {}", self.iterations);
        if let Some(d) = self.duration_ms() {
            println!("Total Duration:  {} ms", d);
        }

        if !self.operation_stats.is_empty() {
            println!("\nOperation Statistics:");
            for operation in Operation::SEQUENCE {
                if let Some(stats) = self.operation_stats.get(&operation) {
                    println!("  - {}", operation);
                    println!("      Count:          {}", stats.count);
                    println!("      Avg Gas:        {:.0}", stats.average_gas());
                    println!("      Total Cost:     {} ETH", format_units(stats.total_cost_wei, ETHER_DECIMALS));
                    println!("      Avg Latency:    {:.3} ms", stats.average_latency_ms());
                    println!("      Min Latency:    {:.3} ms", stats.min_latency_us as f64 / 1000.0);
                    println!("      Max Latency:    {:.3} ms", stats.max_latency_us as f64 / 1000.0);
                }
            }
        }

        if !self.configuration.is_empty() {
            println!("\nConfiguration:");
            for (key, value) in &self.configuration {
                println!("  {}: {}", key, value);
            }
        }
        println!("---------------------------------------\n");
    }
}
