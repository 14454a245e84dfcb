use chrono::Utc;
use ethabi::Hash;
use proptest::prelude::*;
use std::time::{Duration, Instant};

use crate::chain::contract::Operation;
use crate::chain::types::TransactionReceipt;
use crate::metrics::measurement::{format_latency, format_units, GasCost, Measurement};
use crate::metrics::performance::SequenceBenchmark;

fn receipt() -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: Hash::from_low_u64_be(1),
        block_number: Some(3),
        gas_used: Some(49_000),
        status: Some(true),
        contract_address: None,
    }
}

#[test]
fn test_format_units() {
    assert_eq!(format_units(1_000_000_000_000_000, 18), "0.001");
    assert_eq!(format_units(0, 18), "0");
    assert_eq!(format_units(2_000_000_000_000_000_000, 18), "2");
    assert_eq!(format_units(1_500_000_000, 9), "1.5");
    assert_eq!(format_units(1, 18), "0.000000000000000001");
    assert_eq!(format_units(123, 0), "123");
}

#[test]
fn test_gas_cost_units() {
    let cost = GasCost::new(21_000, 1_000_000_000);
    assert_eq!(cost.wei(), 21_000_000_000_000);
    assert_eq!(cost.gwei_string(), "21000");
    assert_eq!(cost.ether_string(), "0.000021");
    assert_eq!(cost.to_string(), "0.000021 ETH (21000 gwei)");
    assert_eq!(GasCost::new(u64::MAX, u128::MAX).wei(), u128::MAX);
}

#[test]
fn test_format_latency_across_boundaries() {
    assert_eq!(format_latency(Duration::from_millis(200)), "00:00:00.200");
    // 59.9s to 60.1s crosses a minute boundary without going negative
    assert_eq!(format_latency(Duration::from_millis(60_100)), "00:01:00.100");
    assert_eq!(format_latency(Duration::from_millis(61_500)), "00:01:01.500");
    assert_eq!(format_latency(Duration::from_millis(3_725_004)), "01:02:05.004");
    assert_eq!(format_latency(Duration::from_secs(90_000)), "25:00:00.000");
}

#[test]
fn test_measurement_clamps_confirmation_to_send_time() {
    let confirmed_at = Instant::now();
    let sent_at = confirmed_at + Duration::from_millis(5);

    let measurement = Measurement::new(Operation::Read, 30_000, 1, Utc::now(), sent_at, confirmed_at, &receipt());

    assert_eq!(measurement.elapsed(), Duration::ZERO);
    assert!(measurement.confirmed_at() >= measurement.sent_at());
}

#[test]
fn test_measurement_json() {
    let sent_at = Instant::now();
    let measurement = Measurement::new(
        Operation::SendEther,
        50_000,
        20_000_000_000,
        Utc::now(),
        sent_at,
        sent_at + Duration::from_millis(1_250),
        &receipt(),
    );

    let json = measurement.to_json();
    assert_eq!(json["operation"], "sendEther");
    assert_eq!(json["cost_ether"], "0.001");
    assert_eq!(json["latency"], "00:00:01.250");
    assert_eq!(json["gas_used"], 49_000);
}

#[test]
fn test_sequence_benchmark_min_max() {
    let mut benchmark = SequenceBenchmark::new("stats");
    benchmark.add_config("gas_price_mode", "fixed");
    let start = Instant::now();
    for millis in [30, 10, 20] {
        let m = Measurement::new(Operation::Write, 100, 2, Utc::now(), start, start + Duration::from_millis(millis), &receipt());
        benchmark.record(&m);
    }
    benchmark.complete_iteration().end();

    let stats = benchmark.get_operation_stats(Operation::Write).unwrap();
    assert_eq!(stats.count, 3);
    assert_eq!(stats.min_latency_us, 10_000);
    assert_eq!(stats.max_latency_us, 30_000);
    assert_eq!(stats.average_latency_ms(), 20.0);
    assert_eq!(stats.total_cost_wei, 600);
    let json = benchmark.to_json();
    assert_eq!(json["name"], "stats");
    assert_eq!(json["iterations"], 1);
    assert_eq!(json["configuration"]["gas_price_mode"], "fixed");
    assert!(json["total_duration_ms"].is_u64());
    assert_eq!(json["operation_stats"]["Write"]["count"], 3);
    assert_eq!(json["operation_stats"]["Write"]["total_cost_ether"], "0.0000000000000006");
    assert!(benchmark.get_operation_stats(Operation::Read).is_none());
}

proptest! {
    #[test]
    fn cost_is_product_of_gas_and_price(gas in any::<u64>(), price in 0u128..=u64::MAX as u128) {
        prop_assert_eq!(GasCost::new(gas, price).wei(), gas as u128 * price);
    }

    #[test]
    fn cost_is_monotonic_in_gas(gas in any::<u64>(), extra in any::<u64>(), price in any::<u128>()) {
        let more = gas.saturating_add(extra);
        prop_assert!(GasCost::new(gas, price) <= GasCost::new(more, price));
    }

    #[test]
    fn cost_is_monotonic_in_price(gas in any::<u64>(), price in any::<u128>(), extra in any::<u128>()) {
        let more = price.saturating_add(extra);
        prop_assert!(GasCost::new(gas, price) <= GasCost::new(gas, more));
    }

    #[test]
    fn ether_string_parses_back_to_wei(wei_gas in 0u64..1_000_000_000, price in 0u128..1_000_000_000_000) {
        let cost = GasCost::new(wei_gas, price);
        let rendered = cost.ether_string();
        let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
        let padded = format!("{:0<18}", fraction);
        let reparsed = whole.parse::<u128>().unwrap() * 1_000_000_000_000_000_000 + padded.parse::<u128>().unwrap();
        prop_assert_eq!(reparsed, cost.wei());
    }

    #[test]
    fn latency_never_negative(offset_ms in 0u64..10_000_000) {
        let start = Instant::now();
        let m = Measurement::new(Operation::Delete, 1, 1, Utc::now(), start, start + Duration::from_millis(offset_ms), &receipt());
        prop_assert_eq!(m.elapsed(), Duration::from_millis(offset_ms));
        prop_assert!(!format_latency(m.elapsed()).contains('-'));
    }
}
