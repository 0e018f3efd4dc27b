//! Prometheus metrics for round resolution.
//!
//! This module provides metrics for:
//! - Round lifecycle (started, completed, aborted)
//! - Transaction outcomes and nonce resyncs
//! - Market data fetch latency and failures
//! - Transaction submit latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::market::Symbol;

// === Metric Name Constants ===

/// Market data fetch latency metric name.
pub const METRIC_FETCH_LATENCY: &str = "kline_fetch_latency_ms";
/// Transaction submit latency metric name.
pub const METRIC_SUBMIT_LATENCY: &str = "tx_submit_latency_ms";
/// Rounds started counter metric name.
pub const METRIC_ROUNDS_STARTED: &str = "rounds_started_total";
/// Rounds completed counter metric name.
pub const METRIC_ROUNDS_COMPLETED: &str = "rounds_completed_total";
/// Rounds aborted counter metric name.
pub const METRIC_ROUNDS_ABORTED: &str = "rounds_aborted_total";
/// Transactions submitted counter metric name.
pub const METRIC_TX_SUBMITTED: &str = "tx_submitted_total";
/// Transactions failed counter metric name.
pub const METRIC_TX_FAILED: &str = "tx_failed_total";
/// Symbols skipped on a tie counter metric name.
pub const METRIC_SYMBOLS_SKIPPED: &str = "symbols_skipped_total";
/// Fetch failures counter metric name.
pub const METRIC_FETCH_FAILURES: &str = "kline_fetch_failures_total";
/// Nonce resyncs counter metric name.
pub const METRIC_NONCE_RESYNCS: &str = "nonce_resyncs_total";

/// Install the Prometheus recorder and return a handle for rendering.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_FETCH_LATENCY,
        "Kline fetch latency in milliseconds"
    );
    describe_histogram!(
        METRIC_SUBMIT_LATENCY,
        "Resolve transaction build/sign/broadcast latency in milliseconds, including dry runs and failures"
    );

    describe_counter!(METRIC_ROUNDS_STARTED, "Total number of rounds started");
    describe_counter!(METRIC_ROUNDS_COMPLETED, "Total number of rounds completed");
    describe_counter!(
        METRIC_ROUNDS_ABORTED,
        "Total number of rounds aborted before any symbol was attempted"
    );
    describe_counter!(
        METRIC_TX_SUBMITTED,
        "Total number of resolve transactions accepted by the node"
    );
    describe_counter!(
        METRIC_TX_FAILED,
        "Total number of resolve transactions that failed"
    );
    describe_counter!(
        METRIC_SYMBOLS_SKIPPED,
        "Total number of symbols skipped on a tie"
    );
    describe_counter!(
        METRIC_FETCH_FAILURES,
        "Total number of kline fetches degraded to neutral stats"
    );
    describe_counter!(
        METRIC_NONCE_RESYNCS,
        "Total number of nonce resynchronizations after a failed submission"
    );

    debug!("Metrics initialized");
}

/// Record kline fetch latency.
pub fn record_fetch_latency(start: Instant, symbol: Symbol) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_FETCH_LATENCY, "symbol" => symbol.as_str()).record(latency_ms);
}

/// Record transaction submit latency.
pub fn record_submit_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_SUBMIT_LATENCY).record(latency_ms);
}

/// Increment rounds started counter.
pub fn inc_rounds_started() {
    counter!(METRIC_ROUNDS_STARTED).increment(1);
}

/// Increment rounds completed counter.
pub fn inc_rounds_completed() {
    counter!(METRIC_ROUNDS_COMPLETED).increment(1);
}

/// Increment rounds aborted counter.
pub fn inc_rounds_aborted() {
    counter!(METRIC_ROUNDS_ABORTED).increment(1);
}

/// Increment transactions submitted counter.
pub fn inc_tx_submitted() {
    counter!(METRIC_TX_SUBMITTED).increment(1);
}

/// Increment transactions failed counter.
pub fn inc_tx_failed() {
    counter!(METRIC_TX_FAILED).increment(1);
}

/// Increment symbols skipped counter.
pub fn inc_symbols_skipped() {
    counter!(METRIC_SYMBOLS_SKIPPED).increment(1);
}

/// Increment fetch failures counter.
pub fn inc_fetch_failures(symbol: Symbol) {
    counter!(METRIC_FETCH_FAILURES, "symbol" => symbol.as_str()).increment(1);
}

/// Increment nonce resyncs counter.
pub fn inc_nonce_resyncs() {
    counter!(METRIC_NONCE_RESYNCS).increment(1);
}
