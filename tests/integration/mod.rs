//! Integration tests for the candle resolver.
//!
//! Most tests drive a full round against the in-memory candle source and
//! chain. The live klines test is ignored by default.
//! Run it with: cargo test --test integration -- --ignored

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_test::assert_ok;

use candle_resolver::chain::{MockChain, MockSubmission};
use candle_resolver::market::{CandleSource, KlinesClient, MockCandleSource, RoundStats, Symbol};
use candle_resolver::round::{
    resolve_round, Outcome, Profile, RoundProfile, SymbolStatus, TiePolicy,
};

fn daily_without_pause() -> RoundProfile {
    RoundProfile {
        submit_pause: Duration::ZERO,
        ..Profile::Daily.params()
    }
}

fn seeded_source() -> MockCandleSource {
    let source = MockCandleSource::new();
    source.set_stats(Symbol::Btc, RoundStats::new(6, 2));
    source.set_stats(Symbol::Eth, RoundStats::new(1, 9));
    source.set_stats(Symbol::Sol, RoundStats::new(5, 5));
    source.set_stats(Symbol::Xrp, RoundStats::new(3, 3));
    source
}

#[tokio::test]
async fn daily_round_submits_winners_and_skips_draws() {
    let source = seeded_source();
    let chain = MockChain::new(42);
    let profile = daily_without_pause();
    assert_eq!(profile.tie_policy, TiePolicy::Skip);

    let report = assert_ok!(resolve_round(&source, &chain, &Symbol::ALL, &profile).await);

    assert_eq!(
        chain.submissions(),
        vec![
            MockSubmission {
                symbol: Symbol::Btc,
                outcome: Outcome::Bull,
                nonce: 42,
                gas_limit: 300_000,
                accepted: true,
            },
            MockSubmission {
                symbol: Symbol::Eth,
                outcome: Outcome::Bear,
                nonce: 43,
                gas_limit: 300_000,
                accepted: true,
            },
        ]
    );
    assert_eq!(report.submitted().count(), 2);
    assert_eq!(report.skipped().count(), 2);
    assert_eq!(report.failed().count(), 0);
    assert_eq!(chain.nonce_queries(), 1);
}

#[tokio::test]
async fn fifteen_minute_round_submits_none_on_ties() {
    let source = seeded_source();
    let chain = MockChain::new(0);
    let profile = Profile::FifteenMin.params();

    let report = assert_ok!(resolve_round(&source, &chain, &Symbol::ALL, &profile).await);

    let outcomes: Vec<_> = chain
        .accepted()
        .into_iter()
        .map(|s| (s.symbol, s.outcome, s.nonce))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            (Symbol::Btc, Outcome::Bull, 0),
            (Symbol::Eth, Outcome::Bear, 1),
            (Symbol::Sol, Outcome::None, 2),
            (Symbol::Xrp, Outcome::None, 3),
        ]
    );
    assert_eq!(report.submitted().count(), 4);
    assert_eq!(source.calls(), Symbol::ALL.iter().map(|&s| (s, 15)).collect::<Vec<_>>());
}

#[tokio::test]
async fn fetch_failure_is_isolated_to_its_symbol() {
    let source = seeded_source();
    source.fail_symbol(Symbol::Btc);
    let chain = MockChain::new(5);
    let profile = Profile::FifteenMin.params();

    let report = assert_ok!(resolve_round(&source, &chain, &Symbol::ALL, &profile).await);

    // BTC degrades to neutral stats and resolves as NONE.
    let btc = &report.results[0];
    assert_eq!(btc.stats, RoundStats::NEUTRAL);
    assert_eq!(btc.outcome, Outcome::None);
    assert!(matches!(btc.status, SymbolStatus::Submitted { nonce: 5, .. }));

    let eth = &report.results[1];
    assert_eq!(eth.outcome, Outcome::Bear);
    assert!(matches!(eth.status, SymbolStatus::Submitted { nonce: 6, .. }));

    assert_eq!(chain.accepted().len(), 4);
}

#[tokio::test]
async fn send_failure_does_not_stop_later_symbols() {
    let source = seeded_source();
    let chain = MockChain::new(10);
    chain.fail_symbol(Symbol::Btc);
    let profile = daily_without_pause();

    let report = assert_ok!(resolve_round(&source, &chain, &Symbol::ALL, &profile).await);

    assert!(matches!(
        report.results[0].status,
        SymbolStatus::Failed { nonce: Some(10), .. }
    ));
    // Nonce 10 was never consumed, so ETH reuses it after the resync.
    assert!(matches!(
        report.results[1].status,
        SymbolStatus::Submitted { nonce: 10, .. }
    ));
    assert_eq!(report.failed().count(), 1);
    assert_eq!(chain.nonce_queries(), 2);
}

#[tokio::test]
async fn round_aborts_when_nonce_is_unreadable() {
    let source = seeded_source();
    let chain = MockChain::new(0);
    chain.fail_nonce_queries(1);

    let result = resolve_round(&source, &chain, &Symbol::ALL, &daily_without_pause()).await;

    assert!(result.is_err());
    assert!(chain.submissions().is_empty());
    assert!(source.calls().is_empty());
}

#[tokio::test]
#[ignore = "requires network access to the klines API"]
async fn live_klines_fetch() {
    let client = KlinesClient::with_http(
        reqwest::Client::new(),
        "https://fapi.binance.com/fapi/v1/klines",
    );

    let candles = assert_ok!(client.fetch_candles(Symbol::Btc, 15).await);
    assert_eq!(candles.len(), 15);

    let stats = client.round_stats(Symbol::Eth, 15).await;
    assert_eq!(stats.total(), 15);
}
