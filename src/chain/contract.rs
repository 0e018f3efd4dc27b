//! Contract address and ABI artifacts.

use std::fs;
use std::path::Path;

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, Bytes, U256};
use serde::Deserialize;
use tracing::debug;

use crate::error::ContractError;
use crate::market::Symbol;
use crate::round::Outcome;

/// Contract method invoked once per symbol per round.
pub const RESOLVE_FUNCTION: &str = "resolve";

/// Hardhat/Truffle style artifact; only the `abi` key is used.
#[derive(Debug, Deserialize)]
struct Artifact {
    abi: JsonAbi,
}

/// Read a contract address from a plain-text file.
pub fn load_contract_address(path: &Path) -> Result<Address, ContractError> {
    let raw = fs::read_to_string(path).map_err(|source| ContractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = raw.trim();

    value
        .parse::<Address>()
        .map_err(|_| ContractError::InvalidAddress {
            path: path.to_path_buf(),
            value: value.to_string(),
        })
}

/// Read an ABI artifact (JSON object with an `abi` key).
pub fn load_abi(path: &Path) -> Result<JsonAbi, ContractError> {
    let raw = fs::read_to_string(path).map_err(|source| ContractError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let artifact: Artifact =
        serde_json::from_str(&raw).map_err(|e| ContractError::InvalidAbi {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok(artifact.abi)
}

/// The contract's `resolve(string,uint8)` entry point.
#[derive(Debug, Clone)]
pub struct ResolveCall {
    /// Deployed contract address.
    pub address: Address,
    /// ABI function used for encoding.
    function: Function,
}

impl ResolveCall {
    /// Pick the `resolve(string,uint8)` overload out of a loaded ABI.
    pub fn from_abi(address: Address, abi: &JsonAbi) -> Result<Self, ContractError> {
        let function = abi
            .function(RESOLVE_FUNCTION)
            .and_then(|overloads| {
                overloads.iter().find(|f| {
                    f.inputs.len() == 2 && f.inputs[0].ty == "string" && f.inputs[1].ty == "uint8"
                })
            })
            .cloned()
            .ok_or(ContractError::MissingResolve)?;

        debug!(
            contract = %address,
            signature = %function.signature(),
            "Loaded resolve function"
        );

        Ok(Self { address, function })
    }

    /// Load address and ABI from their files.
    pub fn load(address_file: &Path, abi_file: &Path) -> Result<Self, ContractError> {
        let address = load_contract_address(address_file)?;
        let abi = load_abi(abi_file)?;
        Self::from_abi(address, &abi)
    }

    /// Four-byte selector of `resolve(string,uint8)`.
    pub fn selector(&self) -> [u8; 4] {
        self.function.selector().0
    }

    /// ABI-encode calldata for `resolve(symbol, outcome)`.
    pub fn encode(&self, symbol: Symbol, outcome: Outcome) -> Result<Bytes, ContractError> {
        let args = [
            DynSolValue::String(symbol.as_str().to_string()),
            DynSolValue::Uint(U256::from(outcome.code()), 8),
        ];

        self.function
            .abi_encode_input(&args)
            .map(Bytes::from)
            .map_err(|e| ContractError::Encode(e.to_string()))
    }
}
