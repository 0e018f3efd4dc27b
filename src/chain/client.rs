//! Chain client: nonce queries and resolve transaction submission.

use std::time::Instant;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::Config;
use crate::error::ChainError;
use crate::market::Symbol;
use crate::metrics;
use crate::round::Outcome;
use crate::signing;

use super::contract::ResolveCall;

/// The chain operations the round driver needs.
#[async_trait]
pub trait ResolutionChain: Send + Sync {
    /// Authoritative next nonce for the operator account.
    async fn next_nonce(&self) -> Result<u64, ChainError>;

    /// Build, sign and broadcast `resolve(symbol, outcome)` with the given
    /// nonce and gas limit. Returns as soon as the node accepts the
    /// transaction; no receipt wait.
    async fn submit_resolve(
        &self,
        symbol: Symbol,
        outcome: Outcome,
        nonce: u64,
        gas_limit: u64,
    ) -> Result<TxHash, ChainError>;
}

/// JSON-RPC backed chain client for the operator account.
#[derive(Clone)]
pub struct ChainClient {
    /// HTTP JSON-RPC provider.
    provider: RootProvider,
    /// Signing wallet for the operator key.
    wallet: EthereumWallet,
    /// Operator address.
    operator: Address,
    /// Target contract entry point.
    contract: ResolveCall,
    /// Chain ID, read once at connect.
    chain_id: u64,
    /// Sign but do not broadcast.
    dry_run: bool,
}

impl ChainClient {
    /// Connect to the configured RPC endpoint and read the chain ID.
    pub async fn connect(config: &Config, contract: ResolveCall) -> Result<Self, ChainError> {
        let url: Url = config
            .base_rpc_url
            .parse()
            .map_err(|e| ChainError::Rpc(format!("invalid rpc url {}: {}", config.base_rpc_url, e)))?;

        let (operator, wallet) = signing::operator_wallet(&config.base_private_key)?;
        let provider = RootProvider::new_http(url);

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Rpc(format!("failed to get chain id: {}", e)))?;

        info!(
            operator = %operator,
            contract = %contract.address,
            chain_id,
            dry_run = config.dry_run,
            "Connected to chain"
        );

        Ok(Self {
            provider,
            wallet,
            operator,
            contract,
            chain_id,
            dry_run: config.dry_run,
        })
    }

    /// Get the operator address.
    pub fn operator(&self) -> Address {
        self.operator
    }

    /// Get the chain ID.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Get the target contract address.
    pub fn contract_address(&self) -> Address {
        self.contract.address
    }

    /// Operator balance in wei.
    #[instrument(skip(self))]
    pub async fn balance(&self) -> Result<U256, ChainError> {
        self.provider
            .get_balance(self.operator)
            .await
            .map_err(|e| ChainError::Rpc(format!("failed to get balance: {}", e)))
    }

    /// Build and sign the resolve transaction, then broadcast it unless
    /// running dry.
    async fn sign_and_send(
        &self,
        symbol: Symbol,
        outcome: Outcome,
        nonce: u64,
        gas_limit: u64,
    ) -> Result<TxHash, ChainError> {
        let input = self.contract.encode(symbol, outcome)?;
        let gas_price = self.gas_price().await?;

        let request = TransactionRequest::default()
            .with_from(self.operator)
            .with_to(self.contract.address)
            .with_input(input)
            .with_nonce(nonce)
            .with_chain_id(self.chain_id)
            .with_gas_limit(gas_limit)
            .with_gas_price(gas_price);

        let envelope = request
            .build(&self.wallet)
            .await
            .map_err(|e| ChainError::Build {
                symbol,
                reason: e.to_string(),
            })?;
        let tx_hash = *envelope.tx_hash();

        if self.dry_run {
            info!(tx_hash = %tx_hash, nonce, gas_price, "DRY RUN - signed, not broadcast");
            return Ok(tx_hash);
        }

        let pending = self
            .provider
            .send_raw_transaction(&envelope.encoded_2718())
            .await
            .map_err(|e| ChainError::Send {
                symbol,
                nonce,
                reason: e.to_string(),
            })?;

        debug!(gas_price, "Broadcast accepted");
        Ok(*pending.tx_hash())
    }

    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ChainError::Rpc(format!("failed to get gas price: {}", e)))
    }
}

#[async_trait]
impl ResolutionChain for ChainClient {
    #[instrument(skip(self))]
    async fn next_nonce(&self) -> Result<u64, ChainError> {
        let nonce = self
            .provider
            .get_transaction_count(self.operator)
            .pending()
            .await
            .map_err(|e| ChainError::Rpc(format!("failed to get transaction count: {}", e)))?;

        debug!(nonce, "Fetched operator nonce");
        Ok(nonce)
    }

    #[instrument(skip(self), fields(symbol = %symbol, outcome = %outcome))]
    async fn submit_resolve(
        &self,
        symbol: Symbol,
        outcome: Outcome,
        nonce: u64,
        gas_limit: u64,
    ) -> Result<TxHash, ChainError> {
        let start = Instant::now();
        let result = self.sign_and_send(symbol, outcome, nonce, gas_limit).await;
        metrics::record_submit_latency(start);
        result
    }
}
