//! Unified error types for the round resolver.

use std::path::PathBuf;

use thiserror::Error;

use crate::market::Symbol;

/// Startup error: anything that stops the resolver before a round runs.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Contract artifact error.
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),

    /// Chain access error.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// HTTP client could not be built.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Startup configuration errors. All of these are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment could not be deserialized (e.g. BASE_PRIVATE_KEY missing).
    #[error("failed to load environment: {0}")]
    Env(#[from] envy::Error),

    /// A value was present but invalid.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Unknown symbol in SYMBOLS.
    #[error("unknown symbol {0:?}")]
    UnknownSymbol(String),

    /// Unknown profile name.
    #[error("unknown profile {0:?}")]
    UnknownProfile(String),
}

/// Market data fetch errors. Recovered per symbol as a neutral result.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Transport failure or timeout.
    #[error("request for {symbol} failed: {source}")]
    Request {
        /// Symbol being fetched.
        symbol: Symbol,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Endpoint answered with a non-success status.
    #[error("request for {symbol} returned HTTP {status}")]
    Status {
        /// Symbol being fetched.
        symbol: Symbol,
        /// HTTP status code.
        status: u16,
    },

    /// Endpoint answered with an error object (`{"code": .., "msg": ..}`).
    #[error("api error for {symbol}: code={code} msg={msg}")]
    Api {
        /// Symbol being fetched.
        symbol: Symbol,
        /// Exchange error code.
        code: i64,
        /// Exchange error message.
        msg: String,
    },

    /// Response body was neither a kline list nor an error object.
    #[error("malformed kline data for {symbol}: {reason}")]
    Malformed {
        /// Symbol being fetched.
        symbol: Symbol,
        /// What was wrong with it.
        reason: String,
    },
}

/// Contract address / ABI artifact errors. Fatal at startup.
#[derive(Error, Debug)]
pub enum ContractError {
    /// Artifact file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Address file did not hold a valid address.
    #[error("invalid contract address in {path}: {value:?}")]
    InvalidAddress {
        /// File path.
        path: PathBuf,
        /// Trimmed file content.
        value: String,
    },

    /// ABI artifact was not valid JSON or lacked an `abi` key.
    #[error("invalid abi artifact {path}: {reason}")]
    InvalidAbi {
        /// File path.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// ABI has no usable `resolve(string,uint8)` function.
    #[error("abi has no resolve(string,uint8) function")]
    MissingResolve,

    /// Calldata encoding failed.
    #[error("failed to encode resolve call: {0}")]
    Encode(String),
}

/// Chain access errors. Recovered per symbol with a nonce resync.
#[derive(Error, Debug)]
pub enum ChainError {
    /// RPC request failed.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Building or signing the transaction failed.
    #[error("failed to build transaction for {symbol}: {reason}")]
    Build {
        /// Symbol being resolved.
        symbol: Symbol,
        /// Reason for failure.
        reason: String,
    },

    /// Broadcasting the signed transaction failed.
    #[error("failed to send transaction for {symbol} with nonce {nonce}: {reason}")]
    Send {
        /// Symbol being resolved.
        symbol: Symbol,
        /// Nonce the transaction carried.
        nonce: u64,
        /// Reason for failure.
        reason: String,
    },

    /// Signer construction failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Contract artifact problem surfaced while submitting.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BotError>;
