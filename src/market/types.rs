//! Market-data types for candle-vote rounds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Supported market symbols, resolved in declaration order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive)]
pub enum Symbol {
    /// Bitcoin.
    #[strum(serialize = "BTC")]
    Btc,
    /// Ether.
    #[strum(serialize = "ETH")]
    Eth,
    /// Solana.
    #[strum(serialize = "SOL")]
    Sol,
    /// XRP.
    #[strum(serialize = "XRP")]
    Xrp,
}

impl Symbol {
    /// Every supported symbol in fixed round order.
    pub const ALL: [Symbol; 4] = [Symbol::Btc, Symbol::Eth, Symbol::Sol, Symbol::Xrp];

    /// Quote asset for kline requests.
    pub const QUOTE_ASSET: &'static str = "USDT";

    /// Ticker as passed to the contract (e.g. "BTC").
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Trading pair for the klines endpoint (e.g. "BTCUSDT").
    pub fn pair(&self) -> String {
        format!("{}{}", self.as_str(), Self::QUOTE_ASSET)
    }
}

/// One fixed-duration price bucket. Only open and close matter here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candle {
    /// Open price.
    pub open: Decimal,
    /// Close price.
    pub close: Decimal,
}

impl Candle {
    /// Create a candle from open and close prices.
    pub fn new(open: Decimal, close: Decimal) -> Self {
        Self { open, close }
    }

    /// Close strictly above open. A flat candle is red.
    pub fn is_green(&self) -> bool {
        self.close > self.open
    }
}

/// Green/red counts over a lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RoundStats {
    /// Candles with close > open.
    pub green: u32,
    /// Candles with close <= open.
    pub red: u32,
}

impl RoundStats {
    /// Result used when market data could not be fetched.
    pub const NEUTRAL: RoundStats = RoundStats { green: 0, red: 0 };

    /// Create stats from explicit counts.
    pub const fn new(green: u32, red: u32) -> Self {
        Self { green, red }
    }

    /// Classify every candle as green or red.
    pub fn from_candles(candles: &[Candle]) -> Self {
        candles.iter().fold(Self::NEUTRAL, |mut stats, candle| {
            if candle.is_green() {
                stats.green += 1;
            } else {
                stats.red += 1;
            }
            stats
        })
    }

    /// Number of candles classified.
    pub fn total(&self) -> u32 {
        self.green + self.red
    }
}
