//! Round driver: fetch, decide and submit for every symbol in order.

use alloy::primitives::TxHash;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::chain::ResolutionChain;
use crate::error::ChainError;
use crate::market::{CandleSource, RoundStats, Symbol};
use crate::metrics;

use super::profile::{Profile, RoundProfile};
use super::resolver::{decide, Decision, Outcome};

/// What happened to one symbol in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolStatus {
    /// Transaction accepted by the node (not awaited for inclusion).
    Submitted {
        /// Transaction hash.
        tx_hash: TxHash,
        /// Nonce used.
        nonce: u64,
    },
    /// Tie under the skip policy; nothing sent.
    Skipped,
    /// Submission failed; abandoned for this round.
    Failed {
        /// Nonce attempted, if one was known.
        nonce: Option<u64>,
        /// Error text.
        reason: String,
    },
}

/// Per-symbol round result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolResolution {
    /// Symbol resolved.
    pub symbol: Symbol,
    /// Candle counts used for the decision.
    pub stats: RoundStats,
    /// Majority-vote outcome.
    pub outcome: Outcome,
    /// What was done with it.
    pub status: SymbolStatus,
}

/// Result of one full pass over the symbols.
#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    /// Profile the round ran under.
    pub profile: Profile,
    /// When the driver started.
    pub started_at: DateTime<Utc>,
    /// When the last symbol was attempted.
    pub finished_at: DateTime<Utc>,
    /// One entry per symbol, in iteration order.
    pub results: Vec<SymbolResolution>,
}

impl RoundReport {
    /// Symbols whose transaction was accepted.
    pub fn submitted(&self) -> impl Iterator<Item = &SymbolResolution> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, SymbolStatus::Submitted { .. }))
    }

    /// Symbols whose submission failed.
    pub fn failed(&self) -> impl Iterator<Item = &SymbolResolution> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, SymbolStatus::Failed { .. }))
    }

    /// Symbols skipped on a tie.
    pub fn skipped(&self) -> impl Iterator<Item = &SymbolResolution> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, SymbolStatus::Skipped))
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} submitted, {} skipped, {} failed",
            self.submitted().count(),
            self.skipped().count(),
            self.failed().count()
        )
    }
}

/// Local nonce counter for one round.
///
/// Incremented after each accepted transaction. After any failure the local
/// value is discarded and re-read from the chain before the next submission.
#[derive(Debug)]
struct NonceState {
    next: Option<u64>,
}

impl NonceState {
    /// Current nonce, querying the chain if the local value was discarded.
    async fn current<C: ResolutionChain + ?Sized>(&mut self, chain: &C) -> Result<u64, ChainError> {
        match self.next {
            Some(nonce) => Ok(nonce),
            None => {
                let nonce = chain.next_nonce().await?;
                self.next = Some(nonce);
                Ok(nonce)
            }
        }
    }

    fn advance(&mut self) {
        self.next = self.next.map(|n| n + 1);
    }

    /// Drop the local value and re-read it from the chain. If the query
    /// fails the value stays unknown and is re-queried on next use.
    async fn resync<C: ResolutionChain + ?Sized>(&mut self, chain: &C) {
        self.next = None;
        metrics::inc_nonce_resyncs();

        match chain.next_nonce().await {
            Ok(nonce) => {
                info!(nonce, "Resynchronized nonce from chain");
                self.next = Some(nonce);
            }
            Err(e) => warn!(error = %e, "Nonce resync failed, will retry before next submission"),
        }
    }
}

/// Run one round over `symbols` in order.
///
/// Fails only if the initial nonce cannot be read. Every per-symbol problem
/// (fetch error, build/sign/send error) is recorded in the report and the
/// round moves on to the next symbol.
#[instrument(skip_all, fields(profile = %profile.profile))]
pub async fn resolve_round<S, C>(
    source: &S,
    chain: &C,
    symbols: &[Symbol],
    profile: &RoundProfile,
) -> Result<RoundReport, ChainError>
where
    S: CandleSource + ?Sized,
    C: ResolutionChain + ?Sized,
{
    let started_at = Utc::now();
    metrics::inc_rounds_started();
    info!(symbols = symbols.len(), lookback = profile.lookback, "Resolving round");

    let mut nonce = NonceState {
        next: Some(chain.next_nonce().await.map_err(|e| {
            metrics::inc_rounds_aborted();
            e
        })?),
    };

    let mut results = Vec::with_capacity(symbols.len());

    for &symbol in symbols {
        let stats = source.round_stats(symbol, profile.lookback).await;
        let outcome = decide(stats);

        let status = match profile.tie_policy.apply(outcome) {
            Decision::Skip => {
                info!(symbol = %symbol, "Draw, skipping resolution");
                metrics::inc_symbols_skipped();
                SymbolStatus::Skipped
            }
            Decision::Submit(outcome) => {
                submit(chain, &mut nonce, symbol, outcome, profile).await
            }
        };

        results.push(SymbolResolution {
            symbol,
            stats,
            outcome,
            status,
        });
    }

    let report = RoundReport {
        profile: profile.profile,
        started_at,
        finished_at: Utc::now(),
        results,
    };

    metrics::inc_rounds_completed();
    info!(summary = %report.summary(), "Round complete");
    Ok(report)
}

async fn submit<C: ResolutionChain + ?Sized>(
    chain: &C,
    nonce: &mut NonceState,
    symbol: Symbol,
    outcome: Outcome,
    profile: &RoundProfile,
) -> SymbolStatus {
    let current = match nonce.current(chain).await {
        Ok(n) => n,
        Err(e) => {
            error!(symbol = %symbol, error = %e, "No nonce available, abandoning symbol");
            metrics::inc_tx_failed();
            return SymbolStatus::Failed {
                nonce: None,
                reason: e.to_string(),
            };
        }
    };

    info!(symbol = %symbol, outcome = %outcome, nonce = current, "Sending resolve transaction");

    match chain
        .submit_resolve(symbol, outcome, current, profile.gas_limit)
        .await
    {
        Ok(tx_hash) => {
            info!(symbol = %symbol, tx_hash = %tx_hash, "Transaction sent");
            metrics::inc_tx_submitted();
            nonce.advance();

            if !profile.submit_pause.is_zero() {
                tokio::time::sleep(profile.submit_pause).await;
            }

            SymbolStatus::Submitted {
                tx_hash,
                nonce: current,
            }
        }
        Err(e) => {
            error!(symbol = %symbol, nonce = current, error = %e, "Resolve transaction failed");
            metrics::inc_tx_failed();
            nonce.resync(chain).await;

            SymbolStatus::Failed {
                nonce: Some(current),
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::chain::MockChain;
    use crate::market::MockCandleSource;
    use crate::round::TiePolicy;

    fn fast_profile(tie_policy: TiePolicy) -> RoundProfile {
        RoundProfile {
            tie_policy,
            submit_pause: Duration::ZERO,
            ..Profile::FifteenMin.params()
        }
    }

    fn source_with(stats: &[(Symbol, RoundStats)]) -> MockCandleSource {
        let source = MockCandleSource::new();
        for &(symbol, s) in stats {
            source.set_stats(symbol, s);
        }
        source
    }

    /// Wraps the mock chain: another sender uses the account whenever one
    /// of our submissions fails.
    struct ExternalSender<'a> {
        inner: &'a MockChain,
        bump_to: u64,
    }

    #[async_trait::async_trait]
    impl ResolutionChain for ExternalSender<'_> {
        async fn next_nonce(&self) -> Result<u64, ChainError> {
            self.inner.next_nonce().await
        }

        async fn submit_resolve(
            &self,
            symbol: Symbol,
            outcome: Outcome,
            nonce: u64,
            gas_limit: u64,
        ) -> Result<TxHash, ChainError> {
            let result = self
                .inner
                .submit_resolve(symbol, outcome, nonce, gas_limit)
                .await;
            if result.is_err() {
                self.inner.set_chain_nonce(self.bump_to);
            }
            result
        }
    }

    /// Wraps the mock chain and fails the second nonce query (the first resync).
    struct FailFirstResync<'a> {
        inner: &'a MockChain,
        queries: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ResolutionChain for FailFirstResync<'_> {
        async fn next_nonce(&self) -> Result<u64, ChainError> {
            if self.queries.fetch_add(1, Ordering::SeqCst) == 1 {
                return Err(ChainError::Rpc("resync down".to_string()));
            }
            self.inner.next_nonce().await
        }

        async fn submit_resolve(
            &self,
            symbol: Symbol,
            outcome: Outcome,
            nonce: u64,
            gas_limit: u64,
        ) -> Result<TxHash, ChainError> {
            self.inner
                .submit_resolve(symbol, outcome, nonce, gas_limit)
                .await
        }
    }

    #[tokio::test]
    async fn success_increments_nonce_without_query() {
        let source = source_with(&[
            (Symbol::Btc, RoundStats::new(5, 3)),
            (Symbol::Eth, RoundStats::new(2, 6)),
        ]);
        let chain = MockChain::new(10);

        let report = resolve_round(
            &source,
            &chain,
            &[Symbol::Btc, Symbol::Eth],
            &fast_profile(TiePolicy::Skip),
        )
        .await
        .unwrap();

        let nonces: Vec<u64> = chain.submissions().iter().map(|s| s.nonce).collect();
        assert_eq!(nonces, vec![10, 11]);
        assert_eq!(chain.nonce_queries(), 1);
        assert_eq!(report.submitted().count(), 2);
    }

    #[tokio::test]
    async fn failure_resyncs_nonce_from_chain() {
        let source = source_with(&[
            (Symbol::Btc, RoundStats::new(5, 3)),
            (Symbol::Eth, RoundStats::new(2, 6)),
            (Symbol::Sol, RoundStats::new(7, 1)),
        ]);
        let chain = MockChain::new(20);
        chain.fail_symbol(Symbol::Eth);
        let wrapped = ExternalSender {
            inner: &chain,
            bump_to: 30,
        };

        let report = resolve_round(
            &source,
            &wrapped,
            &[Symbol::Btc, Symbol::Eth, Symbol::Sol],
            &fast_profile(TiePolicy::Skip),
        )
        .await
        .unwrap();

        let subs = chain.submissions();
        assert_eq!(subs.len(), 3);
        assert_eq!((subs[0].symbol, subs[0].nonce, subs[0].accepted), (Symbol::Btc, 20, true));
        assert_eq!((subs[1].symbol, subs[1].nonce, subs[1].accepted), (Symbol::Eth, 21, false));
        // Fresh chain value, not the local 21 or 22.
        assert_eq!((subs[2].symbol, subs[2].nonce, subs[2].accepted), (Symbol::Sol, 30, true));
        // round start + resync after ETH
        assert_eq!(chain.nonce_queries(), 2);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.submitted().count(), 2);
    }

    #[tokio::test]
    async fn failed_symbol_is_not_retried() {
        let source = source_with(&[(Symbol::Btc, RoundStats::new(5, 3))]);
        let chain = MockChain::new(0);
        chain.fail_symbol(Symbol::Btc);

        let report = resolve_round(&source, &chain, &[Symbol::Btc], &fast_profile(TiePolicy::Skip))
            .await
            .unwrap();

        assert_eq!(chain.submissions().len(), 1);
        assert_eq!(
            report.results[0].status,
            SymbolStatus::Failed {
                nonce: Some(0),
                reason: "failed to send transaction for BTC with nonce 0: Mock send failure"
                    .to_string(),
            }
        );
    }

    #[tokio::test]
    async fn failed_resync_is_retried_before_next_submission() {
        let source = source_with(&[
            (Symbol::Btc, RoundStats::new(5, 3)),
            (Symbol::Eth, RoundStats::new(2, 6)),
        ]);
        let chain = MockChain::new(4);
        chain.fail_symbol(Symbol::Btc);
        let wrapped = FailFirstResync {
            inner: &chain,
            queries: AtomicUsize::new(0),
        };

        let report = resolve_round(
            &source,
            &wrapped,
            &[Symbol::Btc, Symbol::Eth],
            &fast_profile(TiePolicy::Skip),
        )
        .await
        .unwrap();

        assert!(matches!(
            report.results[1].status,
            SymbolStatus::Submitted { nonce: 4, .. }
        ));
        // round start, failed resync (never reaches the mock), lazy re-query
        assert_eq!(wrapped.queries.load(Ordering::SeqCst), 3);
        assert_eq!(chain.nonce_queries(), 2);
    }

    #[tokio::test]
    async fn unavailable_nonce_fails_only_that_symbol() {
        let source = source_with(&[
            (Symbol::Btc, RoundStats::new(5, 3)),
            (Symbol::Eth, RoundStats::new(2, 6)),
            (Symbol::Sol, RoundStats::new(6, 1)),
        ]);
        let chain = MockChain::new(0);
        chain.fail_symbol(Symbol::Btc);

        // Round start succeeds; the resync and ETH's lazy query both fail.
        let wrapped = FailQueriesAfterFirst {
            inner: &chain,
            failures: AtomicUsize::new(2),
            seen: AtomicUsize::new(0),
        };

        let report = resolve_round(
            &source,
            &wrapped,
            &[Symbol::Btc, Symbol::Eth, Symbol::Sol],
            &fast_profile(TiePolicy::Skip),
        )
        .await
        .unwrap();

        assert!(matches!(report.results[1].status, SymbolStatus::Failed { nonce: None, .. }));
        assert!(matches!(
            report.results[2].status,
            SymbolStatus::Submitted { nonce: 0, .. }
        ));
    }

    /// Wraps the mock chain: first nonce query succeeds, the next
    /// `failures` queries fail, later ones succeed.
    struct FailQueriesAfterFirst<'a> {
        inner: &'a MockChain,
        failures: AtomicUsize,
        seen: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ResolutionChain for FailQueriesAfterFirst<'_> {
        async fn next_nonce(&self) -> Result<u64, ChainError> {
            if self.seen.fetch_add(1, Ordering::SeqCst) > 0
                && self
                    .failures
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
            {
                return Err(ChainError::Rpc("rpc down".to_string()));
            }
            self.inner.next_nonce().await
        }

        async fn submit_resolve(
            &self,
            symbol: Symbol,
            outcome: Outcome,
            nonce: u64,
            gas_limit: u64,
        ) -> Result<TxHash, ChainError> {
            self.inner
                .submit_resolve(symbol, outcome, nonce, gas_limit)
                .await
        }
    }

    #[tokio::test]
    async fn initial_nonce_failure_aborts_round() {
        let source = source_with(&[(Symbol::Btc, RoundStats::new(5, 3))]);
        let chain = MockChain::new(0);
        chain.fail_nonce_queries(1);

        let result =
            resolve_round(&source, &chain, &[Symbol::Btc], &fast_profile(TiePolicy::Skip)).await;

        assert!(result.is_err());
        assert!(chain.submissions().is_empty());
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn tie_policy_controls_submission() {
        let source = source_with(&[(Symbol::Xrp, RoundStats::new(4, 4))]);

        let chain = MockChain::new(0);
        let report = resolve_round(&source, &chain, &[Symbol::Xrp], &fast_profile(TiePolicy::Skip))
            .await
            .unwrap();
        assert_eq!(report.results[0].status, SymbolStatus::Skipped);
        assert!(chain.submissions().is_empty());

        let chain = MockChain::new(0);
        let report = resolve_round(
            &source,
            &chain,
            &[Symbol::Xrp],
            &fast_profile(TiePolicy::SubmitNone),
        )
        .await
        .unwrap();
        assert_eq!(report.submitted().count(), 1);
        assert_eq!(chain.submissions()[0].outcome, Outcome::None);
    }

    #[tokio::test]
    async fn gas_limit_and_lookback_come_from_profile() {
        let source = source_with(&[(Symbol::Btc, RoundStats::new(5, 3))]);
        let chain = MockChain::new(0);
        let profile = RoundProfile {
            submit_pause: Duration::ZERO,
            ..Profile::Daily.params()
        };

        resolve_round(&source, &chain, &[Symbol::Btc], &profile)
            .await
            .unwrap();

        assert_eq!(chain.submissions()[0].gas_limit, 300_000);
        assert_eq!(source.calls(), vec![(Symbol::Btc, 1440)]);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_follows_each_success() {
        let source = source_with(&[
            (Symbol::Btc, RoundStats::new(5, 3)),
            (Symbol::Eth, RoundStats::new(2, 6)),
        ]);
        let chain = MockChain::new(0);
        let start = tokio::time::Instant::now();

        resolve_round(
            &source,
            &chain,
            &[Symbol::Btc, Symbol::Eth],
            &Profile::Daily.params(),
        )
        .await
        .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(4));
    }
}
