//! KeyValueStore contract handle, call encoding and build artifacts.

use anyhow::{anyhow, Context, Result};
use ethabi::{Address, ParamType, Token};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::chain::types::{decode_hex, parse_address, CallRequest};
use crate::config::{FIXTURE_ADDRESS, FIXTURE_CIPHER, FIXTURE_ID, FIXTURE_IV};

pub const CONTRACT_NAME: &str = "KeyValueStore";

/// The four contract calls, in the order the benchmark issues them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Write,
    Read,
    Delete,
    SendEther,
}

impl Operation {
    pub const SEQUENCE: [Operation; 4] = [
        Operation::Write,
        Operation::Read,
        Operation::Delete,
        Operation::SendEther,
    ];

    /// Method name as declared in the contract ABI.
    pub fn method_name(&self) -> &'static str {
        match self {
            Operation::Write => "Write",
            Operation::Read => "Read",
            Operation::Delete => "Delete",
            Operation::SendEther => "sendEther",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Identifier passed to `Write`: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdArg {
    Single(String),
    List(Vec<String>),
}

impl IdArg {
    fn param_type(&self) -> ParamType {
        match self {
            IdArg::Single(_) => ParamType::String,
            IdArg::List(_) => ParamType::Array(Box::new(ParamType::String)),
        }
    }

    fn token(&self) -> Token {
        match self {
            IdArg::Single(id) => Token::String(id.clone()),
            IdArg::List(ids) => Token::Array(ids.iter().cloned().map(Token::String).collect()),
        }
    }
}

/// Fixed inputs the benchmark calls the contract with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchArgs {
    pub cipher: Vec<u8>,
    pub iv: Vec<u8>,
    pub address: Address,
    pub id: IdArg,
}

impl BenchArgs {
    /// One-byte ciphertext, fixed iv, fixed owner address and `["12345678"]`.
    pub fn fixture() -> Result<Self> {
        Ok(Self {
            cipher: decode_hex(FIXTURE_CIPHER)?,
            iv: decode_hex(FIXTURE_IV)?,
            address: parse_address(FIXTURE_ADDRESS)?,
            id: IdArg::List(vec![FIXTURE_ID.to_string()]),
        })
    }

    fn params(&self, operation: Operation) -> (Vec<ParamType>, Vec<Token>) {
        match operation {
            Operation::Write => (
                vec![ParamType::Bytes, ParamType::Bytes, ParamType::Address, self.id.param_type()],
                vec![
                    Token::Bytes(self.cipher.clone()),
                    Token::Bytes(self.iv.clone()),
                    Token::Address(self.address),
                    self.id.token(),
                ],
            ),
            Operation::Read | Operation::Delete | Operation::SendEther => {
                (vec![ParamType::Address], vec![Token::Address(self.address)])
            }
        }
    }

    /// 4-byte function selector for `operation` with these arguments.
    pub fn selector(&self, operation: Operation) -> [u8; 4] {
        let (params, _) = self.params(operation);
        ethabi::short_signature(operation.method_name(), &params)
    }

    /// Selector followed by the ABI-encoded arguments.
    pub fn call_data(&self, operation: Operation) -> Vec<u8> {
        let (params, tokens) = self.params(operation);
        let mut data = ethabi::short_signature(operation.method_name(), &params).to_vec();
        data.extend(ethabi::encode(&tokens));
        data
    }
}

/// A deployed KeyValueStore instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValueStore {
    address: Address,
}

impl KeyValueStore {
    pub fn at(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Transaction invoking `operation` from `from`.
    pub fn call(&self, from: Address, args: &BenchArgs, operation: Operation) -> CallRequest {
        CallRequest {
            from: Some(from),
            to: Some(self.address),
            data: args.call_data(operation),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactNetwork {
    pub address: String,
}

/// Truffle build artifact (`build/contracts/<Name>.json`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub bytecode: String,
    #[serde(default)]
    pub networks: HashMap<String, ArtifactNetwork>,
}

impl ContractArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read contract artifact {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid contract artifact {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let artifact: ContractArtifact = serde_json::from_str(raw)?;
        if artifact.contract_name != CONTRACT_NAME {
            log::warn!(
                "Artifact describes contract {}, expected {}",
                artifact.contract_name,
                CONTRACT_NAME
            );
        }
        Ok(artifact)
    }

    /// Creation bytecode.
    pub fn bytecode(&self) -> Result<Vec<u8>> {
        let bytes = decode_hex(&self.bytecode)?;
        if bytes.is_empty() {
            return Err(anyhow!("Artifact for {} has empty bytecode (abstract contract or interface?)", self.contract_name));
        }
        Ok(bytes)
    }

    /// Address recorded for `network_id` by a previous migration, if any.
    pub fn deployed_address(&self, network_id: &str) -> Result<Option<Address>> {
        self.networks
            .get(network_id)
            .map(|network| parse_address(&network.address))
            .transpose()
    }
}
