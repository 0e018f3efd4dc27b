//! Candle-vote round resolver.
//!
//! Counts green vs red 1-minute candles for a fixed set of symbols and
//! submits the majority outcome to a prediction-market contract by calling
//! `resolve(symbol, outcome)` once per symbol per round.
//!
//! # Outcome
//!
//! ```text
//! green > red   ->  BULL (1)
//! red > green   ->  BEAR (2)
//! green == red  ->  NONE (0), or skipped under the daily profile
//! ```
//!
//! A candle whose close equals its open counts as red.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Symbols, candles and the klines client
//! - [`round`]: Winner resolution, profiles, round driver and scheduling
//! - [`chain`]: Contract artifacts and transaction submission
//! - [`signing`]: Operator key handling
//! - [`api`]: HTTP API for health/status/metrics
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod market;
pub mod metrics;
pub mod round;
pub mod signing;
pub mod utils;

pub use config::Config;
pub use error::{BotError, Result};
