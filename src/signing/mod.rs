//! Operator key handling.
//!
//! This module provides utilities for:
//! - Creating signers from hex private keys
//! - Computing the operator address

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use tracing::debug;

use crate::error::ChainError;

/// Create a LocalSigner from a hex-encoded private key.
///
/// The private key can be with or without the "0x" prefix.
pub fn create_signer(private_key: &str) -> Result<PrivateKeySigner, ChainError> {
    let key = private_key.trim();
    let key = key.strip_prefix("0x").unwrap_or(key);
    let bytes = hex::decode(key)
        .map_err(|e| ChainError::Signing(format!("Invalid private key hex: {}", e)))?;

    if bytes.len() != 32 {
        return Err(ChainError::Signing(format!(
            "Private key must be 32 bytes, got {}",
            bytes.len()
        )));
    }

    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&bytes);

    PrivateKeySigner::from_bytes(&key_bytes.into())
        .map_err(|e| ChainError::Signing(format!("Failed to create signer: {}", e)))
}

/// Build the transaction wallet for the operator key.
pub fn operator_wallet(private_key: &str) -> Result<(Address, EthereumWallet), ChainError> {
    let signer = create_signer(private_key)?;
    let address = signer.address();
    debug!(operator = %address, "Created operator wallet");
    Ok((address, EthereumWallet::from(signer)))
}

/// Get the checksummed operator address from a private key.
pub fn address_from_private_key(private_key: &str) -> Result<String, ChainError> {
    let signer = create_signer(private_key)?;
    Ok(signer.address().to_checksum(None))
}
