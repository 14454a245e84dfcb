//! Wire types and hex codecs shared by the provider and the contract layer.

use anyhow::{anyhow, Result};
use ethabi::{Address, Hash};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Decodes a `0x`-prefixed (or bare) hex string into bytes.
pub fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let digits = strip_hex_prefix(input);
    hex::decode(digits).map_err(|e| anyhow!("invalid hex string {:?}: {}", input, e))
}

/// Encodes bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn parse_address(input: &str) -> Result<Address> {
    let bytes = decode_hex(input)?;
    if bytes.len() != 20 {
        return Err(anyhow!("address {} is {} bytes long, expected 20", input, bytes.len()));
    }
    Ok(Address::from_slice(&bytes))
}

pub fn parse_hash(input: &str) -> Result<Hash> {
    let bytes = decode_hex(input)?;
    if bytes.len() != 32 {
        return Err(anyhow!("hash {} is {} bytes long, expected 32", input, bytes.len()));
    }
    Ok(Hash::from_slice(&bytes))
}

/// Parses a JSON-RPC quantity (`0x`-prefixed, no leading zeros required).
pub fn parse_quantity(input: &str) -> Result<u128> {
    let digits = strip_hex_prefix(input);
    if digits.is_empty() {
        return Err(anyhow!("empty quantity"));
    }
    u128::from_str_radix(digits, 16).map_err(|e| anyhow!("invalid quantity {:?}: {}", input, e))
}

pub fn to_quantity(value: u128) -> String {
    format!("0x{:x}", value)
}

fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

/// Transaction object accepted by `eth_estimateGas` and `eth_sendTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub data: Vec<u8>,
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
}

impl CallRequest {
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        if let Some(from) = &self.from {
            object.insert("from".into(), Value::String(encode_hex(from.as_bytes())));
        }
        if let Some(to) = &self.to {
            object.insert("to".into(), Value::String(encode_hex(to.as_bytes())));
        }
        object.insert("data".into(), Value::String(encode_hex(&self.data)));
        if let Some(gas) = self.gas {
            object.insert("gas".into(), Value::String(to_quantity(gas as u128)));
        }
        if let Some(gas_price) = self.gas_price {
            object.insert("gasPrice".into(), Value::String(to_quantity(gas_price)));
        }
        Value::Object(object)
    }
}

/// Receipt as the node serializes it. Only the fields the harness reads are kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: Hash,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    /// `None` on pre-Byzantium nodes, which do not report a status.
    pub status: Option<bool>,
    pub contract_address: Option<Address>,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        self.status.unwrap_or(true)
    }
}

impl TryFrom<RawReceipt> for TransactionReceipt {
    type Error = anyhow::Error;

    fn try_from(raw: RawReceipt) -> Result<Self> {
        let block_number = raw.block_number.as_deref().map(parse_u64).transpose()?;
        let gas_used = raw.gas_used.as_deref().map(parse_u64).transpose()?;
        let status = raw
            .status
            .as_deref()
            .map(|s| parse_quantity(s).map(|v| v == 1))
            .transpose()?;
        let contract_address = raw
            .contract_address
            .as_deref()
            .map(parse_address)
            .transpose()?;

        Ok(Self {
            transaction_hash: parse_hash(&raw.transaction_hash)?,
            block_number,
            gas_used,
            status,
            contract_address,
        })
    }
}

pub(crate) fn parse_u64(input: &str) -> Result<u64> {
    let value = parse_quantity(input)?;
    u64::try_from(value).map_err(|_| anyhow!("quantity {} does not fit in u64", input))
}
