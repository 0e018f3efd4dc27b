//! Market data for candle-vote rounds.
//!
//! This module handles:
//! - Symbol, candle and stats types
//! - The `CandleSource` seam used by the round driver
//! - Binance klines client
//! - Mock source for testing

pub mod client;
pub mod mock;
pub mod source;
pub mod types;

pub use client::KlinesClient;
pub use mock::MockCandleSource;
pub use source::CandleSource;
pub use types::{Candle, RoundStats, Symbol};
