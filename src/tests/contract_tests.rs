use anyhow::Result;
use ethabi::Address;

use crate::chain::contract::{BenchArgs, ContractArtifact, IdArg, KeyValueStore, Operation};
use crate::chain::types::{encode_hex, parse_address, parse_quantity, to_quantity, CallRequest, RawReceipt, TransactionReceipt};

const ARTIFACT: &str = r#"{
    "contractName": "KeyValueStore",
    "abi": [],
    "bytecode": "0x6080604052",
    "networks": {
        "5777": { "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3", "transactionHash": "0x00" }
    }
}"#;

#[test]
fn test_fixture_matches_reference_inputs() -> Result<()> {
    let args = BenchArgs::fixture()?;
    assert_eq!(args.cipher, vec![0x01]);
    assert_eq!(args.iv, hex::decode("1234567890abcdef12345678")?);
    assert_eq!(encode_hex(args.address.as_bytes()), "0x742d35cc6634c0532925a3b844bc454e4438f44e");
    assert_eq!(args.id, IdArg::List(vec!["12345678".to_string()]));
    Ok(())
}

#[test]
fn test_call_data_starts_with_selector() -> Result<()> {
    let args = BenchArgs::fixture()?;
    for operation in Operation::SEQUENCE {
        let data = args.call_data(operation);
        assert_eq!(&data[..4], &args.selector(operation)[..]);
    }
    Ok(())
}

#[test]
fn test_selectors_are_distinct() -> Result<()> {
    let args = BenchArgs::fixture()?;
    let mut selectors: Vec<[u8; 4]> = Operation::SEQUENCE.iter().map(|op| args.selector(*op)).collect();
    selectors.sort();
    selectors.dedup();
    assert_eq!(selectors.len(), 4);

    let mut scalar = args.clone();
    scalar.id = IdArg::Single("12345678".to_string());
    assert_ne!(scalar.selector(Operation::Write), args.selector(Operation::Write));
    assert_eq!(scalar.selector(Operation::Read), args.selector(Operation::Read));
    Ok(())
}

#[test]
fn test_address_only_calls_encode_one_word() -> Result<()> {
    let args = BenchArgs::fixture()?;
    for operation in [Operation::Read, Operation::Delete, Operation::SendEther] {
        let data = args.call_data(operation);
        assert_eq!(data.len(), 4 + 32);
        assert!(data[4..16].iter().all(|b| *b == 0));
        assert_eq!(&data[16..36], args.address.as_bytes());
    }
    Ok(())
}

#[test]
fn test_write_encodes_dynamic_arguments() -> Result<()> {
    let args = BenchArgs::fixture()?;
    let data = args.call_data(Operation::Write);

    // head: 4 words; cipher and iv: length + one padded word each;
    // string[]: length, one offset, then the string's length and data.
    assert_eq!(data.len(), 4 + 4 * 32 + 2 * 64 + 4 * 32);
    // third head word is the address
    assert_eq!(&data[4 + 2 * 32 + 12..4 + 3 * 32], args.address.as_bytes());
    Ok(())
}

#[test]
fn test_contract_call_targets_instance() -> Result<()> {
    let args = BenchArgs::fixture()?;
    let contract = KeyValueStore::at(Address::from_low_u64_be(7));
    let from = Address::from_low_u64_be(8);

    let request = contract.call(from, &args, Operation::Delete);
    assert_eq!(request.to, Some(contract.address()));
    assert_eq!(request.from, Some(from));
    assert_eq!(request.data, args.call_data(Operation::Delete));
    assert_eq!(request.gas, None);
    Ok(())
}

#[test]
fn test_call_request_json_uses_quantities() {
    let request = CallRequest {
        from: Some(Address::from_low_u64_be(1)),
        to: None,
        data: vec![0xde, 0xad],
        gas: Some(50_000),
        gas_price: Some(20_000_000_000),
    };
    let json = request.to_json();
    assert_eq!(json["gas"], "0xc350");
    assert_eq!(json["gasPrice"], "0x4a817c800");
    assert_eq!(json["data"], "0xdead");
    assert!(json.get("to").is_none());
    assert!(json.get("value").is_none());
    assert_eq!(json.as_object().map(|o| o.len()), Some(4));
}

#[test]
fn test_quantity_round_trip_edge_cases() -> Result<()> {
    assert_eq!(parse_quantity("0x0")?, 0);
    assert_eq!(to_quantity(0), "0x0");
    assert_eq!(parse_quantity("0x4a817c800")?, 20_000_000_000);
    assert!(parse_quantity("0x").is_err());
    assert!(parse_quantity("0xzz").is_err());
    assert!(parse_address("0x1234").is_err());
    Ok(())
}

#[test]
fn test_receipt_conversion() -> Result<()> {
    let raw: RawReceipt = serde_json::from_value(serde_json::json!({
        "transactionHash": format!("0x{}", "11".repeat(32)),
        "blockNumber": "0x10",
        "gasUsed": "0x5208",
        "status": "0x0",
        "contractAddress": null
    }))?;
    let receipt = TransactionReceipt::try_from(raw)?;
    assert_eq!(receipt.block_number, Some(16));
    assert_eq!(receipt.gas_used, Some(21_000));
    assert_eq!(receipt.status, Some(false));
    assert!(!receipt.is_success());
    assert_eq!(receipt.contract_address, None);
    Ok(())
}

#[test]
fn test_artifact_parsing() -> Result<()> {
    let artifact = ContractArtifact::from_json(ARTIFACT)?;
    assert_eq!(artifact.contract_name, "KeyValueStore");
    assert_eq!(artifact.bytecode()?, vec![0x60, 0x80, 0x60, 0x40, 0x52]);
    assert_eq!(
        artifact.deployed_address("5777")?,
        Some(parse_address("0x5FbDB2315678afecb367f032d93F642f64180aa3")?)
    );
    assert_eq!(artifact.deployed_address("1")?, None);
    Ok(())
}

#[test]
fn test_artifact_without_bytecode_is_rejected() -> Result<()> {
    let artifact = ContractArtifact::from_json(r#"{"contractName": "KeyValueStore", "bytecode": "0x"}"#)?;
    assert!(artifact.networks.is_empty());
    assert!(artifact.bytecode().is_err());
    assert!(ContractArtifact::from_json("{}").is_err());
    Ok(())
}
