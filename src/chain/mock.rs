//! Mock chain for unit testing.
//!
//! Simulates an account whose pending nonce advances with every accepted
//! transaction, with scripted submission and nonce-query failures.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, TxHash};
use async_trait::async_trait;

use crate::error::ChainError;
use crate::market::Symbol;
use crate::round::Outcome;

use super::client::ResolutionChain;

/// A submission seen by the mock chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSubmission {
    /// Symbol resolved.
    pub symbol: Symbol,
    /// Outcome submitted.
    pub outcome: Outcome,
    /// Nonce the transaction carried.
    pub nonce: u64,
    /// Gas limit the transaction carried.
    pub gas_limit: u64,
    /// Whether the mock accepted it.
    pub accepted: bool,
}

#[derive(Debug, Default)]
struct MockChainState {
    /// Next pending nonce as the network sees it.
    chain_nonce: u64,
    /// Number of `next_nonce` calls.
    nonce_queries: usize,
    /// Remaining `next_nonce` calls that should fail.
    failing_nonce_queries: usize,
    /// Symbols whose submission fails.
    failing_symbols: HashSet<Symbol>,
    /// Every submission attempt, in order.
    submissions: Vec<MockSubmission>,
}

/// Mock chain for testing.
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<MockChainState>>,
}

impl MockChain {
    /// Create a mock chain whose account starts at `nonce`.
    pub fn new(nonce: u64) -> Self {
        let chain = Self::default();
        chain.state.lock().unwrap().chain_nonce = nonce;
        chain
    }

    /// Overwrite the network nonce (e.g. another sender used the account).
    pub fn set_chain_nonce(&self, nonce: u64) {
        self.state.lock().unwrap().chain_nonce = nonce;
    }

    /// Make every submission for a symbol fail.
    pub fn fail_symbol(&self, symbol: Symbol) {
        self.state.lock().unwrap().failing_symbols.insert(symbol);
    }

    /// Make the next `count` nonce queries fail.
    pub fn fail_nonce_queries(&self, count: usize) {
        self.state.lock().unwrap().failing_nonce_queries = count;
    }

    /// Number of nonce queries made so far.
    pub fn nonce_queries(&self) -> usize {
        self.state.lock().unwrap().nonce_queries
    }

    /// Every submission attempt so far.
    pub fn submissions(&self) -> Vec<MockSubmission> {
        self.state.lock().unwrap().submissions.clone()
    }

    /// Only the accepted submissions.
    pub fn accepted(&self) -> Vec<MockSubmission> {
        self.submissions().into_iter().filter(|s| s.accepted).collect()
    }
}

#[async_trait]
impl ResolutionChain for MockChain {
    async fn next_nonce(&self) -> Result<u64, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.nonce_queries += 1;

        if state.failing_nonce_queries > 0 {
            state.failing_nonce_queries -= 1;
            return Err(ChainError::Rpc("Mock nonce query failure".to_string()));
        }

        Ok(state.chain_nonce)
    }

    async fn submit_resolve(
        &self,
        symbol: Symbol,
        outcome: Outcome,
        nonce: u64,
        gas_limit: u64,
    ) -> Result<TxHash, ChainError> {
        let mut state = self.state.lock().unwrap();

        let reason = if state.failing_symbols.contains(&symbol) {
            Some("Mock send failure".to_string())
        } else if nonce != state.chain_nonce {
            Some(format!("nonce mismatch: expected {}, got {}", state.chain_nonce, nonce))
        } else {
            None
        };

        state.submissions.push(MockSubmission {
            symbol,
            outcome,
            nonce,
            gas_limit,
            accepted: reason.is_none(),
        });

        match reason {
            Some(reason) => Err(ChainError::Send {
                symbol,
                nonce,
                reason,
            }),
            None => {
                state.chain_nonce += 1;
                Ok(keccak256(format!("{}:{}:{}", symbol, outcome.code(), nonce)))
            }
        }
    }
}
