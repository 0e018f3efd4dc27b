//! Binance futures klines client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::MarketDataError;
use crate::metrics;

use super::source::CandleSource;
use super::types::{Candle, Symbol};

/// Candle interval requested from the klines endpoint.
pub const KLINE_INTERVAL: &str = "1m";

/// Kline row index of the open price.
const OPEN_INDEX: usize = 1;
/// Kline row index of the close price.
const CLOSE_INDEX: usize = 4;

/// Error object returned by Binance instead of a kline list.
#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    code: i64,
    #[serde(default)]
    msg: String,
}

/// HTTP client for the klines endpoint.
#[derive(Debug, Clone)]
pub struct KlinesClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Full klines endpoint URL.
    klines_url: String,
}

impl KlinesClient {
    /// Create a klines client from config.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self::with_http(http, config.klines_url.clone()))
    }

    /// Create a klines client around an existing HTTP client.
    pub fn with_http(http: reqwest::Client, klines_url: impl Into<String>) -> Self {
        Self {
            http,
            klines_url: klines_url.into(),
        }
    }
}

#[async_trait]
impl CandleSource for KlinesClient {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_candles(
        &self,
        symbol: Symbol,
        lookback: u32,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let start = Instant::now();

        let response = self
            .http
            .get(&self.klines_url)
            .query(&[
                ("symbol", symbol.pair()),
                ("interval", KLINE_INTERVAL.to_string()),
                ("limit", lookback.to_string()),
            ])
            .send()
            .await
            .map_err(|source| MarketDataError::Request { symbol, source })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| MarketDataError::Request { symbol, source })?;

        metrics::record_fetch_latency(start, symbol);

        let candles = decode_response(symbol, status, &body)?;
        debug!(count = candles.len(), "Fetched klines");
        Ok(candles)
    }
}

/// Map a klines response to candles or the matching error.
///
/// An error object wins over the status code, since Binance puts one in the
/// body of its 4xx responses. Any other non-2xx status is a `Status` error
/// whatever the body holds.
pub fn decode_response(
    symbol: Symbol,
    status: StatusCode,
    body: &[u8],
) -> Result<Vec<Candle>, MarketDataError> {
    if let Ok(err) = serde_json::from_slice::<ApiErrorResponse>(body) {
        return Err(MarketDataError::Api {
            symbol,
            code: err.code,
            msg: err.msg,
        });
    }

    if !status.is_success() {
        return Err(MarketDataError::Status {
            symbol,
            status: status.as_u16(),
        });
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| MarketDataError::Malformed {
        symbol,
        reason: e.to_string(),
    })?;

    parse_klines(symbol, &value)
}

/// Decode a kline list into candles.
pub fn parse_klines(symbol: Symbol, body: &Value) -> Result<Vec<Candle>, MarketDataError> {
    let rows = body.as_array().ok_or_else(|| MarketDataError::Malformed {
        symbol,
        reason: "expected a JSON array of klines".to_string(),
    })?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let open = price_at(symbol, row, i, OPEN_INDEX)?;
            let close = price_at(symbol, row, i, CLOSE_INDEX)?;
            Ok(Candle::new(open, close))
        })
        .collect()
}

fn price_at(
    symbol: Symbol,
    row: &Value,
    row_index: usize,
    field: usize,
) -> Result<Decimal, MarketDataError> {
    let malformed = |reason: String| MarketDataError::Malformed { symbol, reason };

    let value = row
        .get(field)
        .ok_or_else(|| malformed(format!("kline {} has no field {}", row_index, field)))?;

    let text = value
        .as_str()
        .ok_or_else(|| malformed(format!("kline {} field {} is not a string", row_index, field)))?;

    text.parse::<Decimal>()
        .map_err(|e| malformed(format!("kline {} field {}: {}", row_index, field, e)))
}
