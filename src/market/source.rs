//! Candle source abstraction used by the round driver.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::MarketDataError;
use crate::metrics;

use super::types::{Candle, RoundStats, Symbol};

/// Anything that can return the most recent 1m candles for a symbol.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch the `lookback` most recent candles. Single attempt, no retry.
    async fn fetch_candles(
        &self,
        symbol: Symbol,
        lookback: u32,
    ) -> Result<Vec<Candle>, MarketDataError>;

    /// Green/red counts for a symbol.
    ///
    /// Any fetch error degrades to [`RoundStats::NEUTRAL`] so one bad symbol
    /// never aborts the rest of the round.
    async fn round_stats(&self, symbol: Symbol, lookback: u32) -> RoundStats {
        match self.fetch_candles(symbol, lookback).await {
            Ok(candles) => {
                let stats = RoundStats::from_candles(&candles);
                info!(
                    symbol = %symbol,
                    green = stats.green,
                    red = stats.red,
                    "Candle stats"
                );
                stats
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Failed to fetch candles, using neutral stats");
                metrics::inc_fetch_failures(symbol);
                RoundStats::NEUTRAL
            }
        }
    }
}
