//! Mock candle source for unit testing.
//!
//! This module provides a candle source that can be used in tests
//! without making real network requests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::MarketDataError;

use super::source::CandleSource;
use super::types::{Candle, RoundStats, Symbol};

/// Mock candle source for testing.
#[derive(Debug, Clone, Default)]
pub struct MockCandleSource {
    /// Canned candles by symbol.
    candles: Arc<Mutex<HashMap<Symbol, Vec<Candle>>>>,
    /// Symbols whose fetch fails.
    failing: Arc<Mutex<HashSet<Symbol>>>,
    /// Every (symbol, lookback) requested, in order.
    calls: Arc<Mutex<Vec<(Symbol, u32)>>>,
}

impl MockCandleSource {
    /// Create an empty mock source. Unconfigured symbols return no candles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the candles returned for a symbol.
    pub fn set_candles(&self, symbol: Symbol, candles: Vec<Candle>) {
        self.candles.lock().unwrap().insert(symbol, candles);
    }

    /// Set candles that produce exactly the given green/red counts.
    pub fn set_stats(&self, symbol: Symbol, stats: RoundStats) {
        let green = Candle::new(Decimal::ONE, Decimal::TWO);
        let red = Candle::new(Decimal::TWO, Decimal::ONE);

        let mut candles = vec![green; stats.green as usize];
        candles.extend(std::iter::repeat(red).take(stats.red as usize));
        self.set_candles(symbol, candles);
    }

    /// Make every fetch for a symbol fail.
    pub fn fail_symbol(&self, symbol: Symbol) {
        self.failing.lock().unwrap().insert(symbol);
    }

    /// Requests made so far.
    pub fn calls(&self) -> Vec<(Symbol, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandleSource for MockCandleSource {
    async fn fetch_candles(
        &self,
        symbol: Symbol,
        lookback: u32,
    ) -> Result<Vec<Candle>, MarketDataError> {
        self.calls.lock().unwrap().push((symbol, lookback));

        if self.failing.lock().unwrap().contains(&symbol) {
            return Err(MarketDataError::Api {
                symbol,
                code: -1003,
                msg: "Mock rate limit".to_string(),
            });
        }

        Ok(self
            .candles
            .lock()
            .unwrap()
            .get(&symbol)
            .cloned()
            .unwrap_or_default())
    }
}
