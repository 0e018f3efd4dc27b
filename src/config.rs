//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::market::Symbol;
use crate::round::{Profile, RoundProfile};

/// Tracing filter directive used for verbose logging.
pub const VERBOSE_LOG_DIRECTIVE: &str = "candle_resolver=debug,info";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Chain ===
    /// Operator private key (hex). Required.
    pub base_private_key: String,

    /// JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub base_rpc_url: String,

    /// Override for the profile's contract address file.
    #[serde(default)]
    pub contract_address_file: Option<PathBuf>,

    /// Override for the profile's contract ABI artifact.
    #[serde(default)]
    pub contract_abi_file: Option<PathBuf>,

    // === Rounds ===
    /// Round profile: "daily" or "fifteen-min".
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Symbols to resolve, comma separated, in order.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Sign transactions but do not broadcast them.
    #[serde(default)]
    pub dry_run: bool,

    // === Market Data ===
    /// Klines endpoint URL.
    #[serde(default = "default_klines_url")]
    pub klines_url: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Server Configuration ===
    /// HTTP server port for health/status endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Install the Prometheus recorder and serve /metrics.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_rpc_url() -> String {
    "https://sepolia.base.org".to_string()
}

fn default_profile() -> String {
    Profile::FifteenMin.to_string()
}

fn default_symbols() -> Vec<String> {
    Symbol::ALL.iter().map(|s| s.to_string()).collect()
}

fn default_klines_url() -> String {
    "https://fapi.binance.com/fapi/v1/klines".to_string()
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Tracing filter directive. Verbose logging (flag or VERBOSE) wins over
    /// RUST_LOG.
    pub fn log_directive(&self, verbose_flag: bool) -> &str {
        if verbose_flag || self.verbose {
            VERBOSE_LOG_DIRECTIVE
        } else {
            &self.rust_log
        }
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.base_private_key.trim();
        if key.is_empty() {
            return Err(ConfigError::Invalid("BASE_PRIVATE_KEY is required".to_string()));
        }

        let hex_len = key.strip_prefix("0x").unwrap_or(key).len();
        if hex_len != 64 {
            return Err(ConfigError::Invalid(format!(
                "BASE_PRIVATE_KEY must be 32 bytes of hex, got {} characters",
                hex_len
            )));
        }

        if url::Url::parse(&self.base_rpc_url).is_err() {
            return Err(ConfigError::Invalid(format!(
                "BASE_RPC_URL is not a valid URL: {}",
                self.base_rpc_url
            )));
        }

        if url::Url::parse(&self.klines_url).is_err() {
            return Err(ConfigError::Invalid(format!(
                "KLINES_URL is not a valid URL: {}",
                self.klines_url
            )));
        }

        if self.http_timeout_ms == 0 {
            return Err(ConfigError::Invalid("HTTP_TIMEOUT_MS must be positive".to_string()));
        }

        self.profile()?;
        if self.symbols()?.is_empty() {
            return Err(ConfigError::Invalid("SYMBOLS must not be empty".to_string()));
        }

        Ok(())
    }

    /// Parsed profile name.
    pub fn profile(&self) -> Result<Profile, ConfigError> {
        self.profile
            .trim()
            .parse()
            .map_err(|_| ConfigError::UnknownProfile(self.profile.clone()))
    }

    /// Parsed symbol list, in configured order, without duplicates.
    pub fn symbols(&self) -> Result<Vec<Symbol>, ConfigError> {
        let mut symbols = Vec::with_capacity(self.symbols.len());
        for raw in &self.symbols {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let symbol: Symbol = raw
                .parse()
                .map_err(|_| ConfigError::UnknownSymbol(raw.to_string()))?;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        Ok(symbols)
    }

    /// Profile parameters with any file overrides applied.
    pub fn round_profile(&self, profile: Profile) -> RoundProfile {
        let mut params = profile.params();
        if let Some(path) = &self.contract_address_file {
            params.address_file = path.clone();
        }
        if let Some(path) = &self.contract_abi_file {
            params.abi_file = path.clone();
        }
        params
    }
}
