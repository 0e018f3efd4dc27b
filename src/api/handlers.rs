//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::round::{Profile, RoundReport};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether the resolver loop is up and waiting for boundaries.
    pub ready: Arc<AtomicBool>,
    /// Profile being run.
    pub profile: Profile,
    /// Operator address.
    pub operator: Arc<RwLock<Option<String>>>,
    /// Number of rounds completed since start.
    pub rounds_completed: Arc<AtomicU64>,
    /// Report of the most recent round.
    pub last_round: Arc<RwLock<Option<RoundReport>>>,
    /// Prometheus handle, when the recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(profile: Profile) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            profile,
            operator: Arc::new(RwLock::new(None)),
            rounds_completed: Arc::new(AtomicU64::new(0)),
            last_round: Arc::new(RwLock::new(None)),
            prometheus: None,
        }
    }

    /// Attach a Prometheus handle for the /metrics endpoint.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Store a finished round.
    pub async fn record_round(&self, report: RoundReport) {
        self.rounds_completed.fetch_add(1, Ordering::SeqCst);
        *self.last_round.write().await = Some(report);
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether service is ready.
    pub ready: bool,
    /// Profile being run.
    pub profile: Profile,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// Profile being run.
    pub profile: Profile,
    /// Operator address.
    pub operator: Option<String>,
    /// Rounds completed since start.
    pub rounds_completed: u64,
    /// Most recent round.
    pub last_round: Option<RoundReport>,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let response = ReadyResponse {
        ready: is_ready,
        profile: state.profile,
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - returns the last round report.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.is_ready() { "running" } else { "starting" };

    Json(StatusResponse {
        status,
        profile: state.profile,
        operator: state.operator.read().await.clone(),
        rounds_completed: state.rounds_completed.load(Ordering::SeqCst),
        last_round: state.last_round.read().await.clone(),
    })
}

/// Prometheus text exposition, 404 when metrics are disabled.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn app_state_ready_toggle() {
        let state = AppState::new(Profile::FifteenMin);
        assert!(!state.is_ready());

        state.set_ready(true);
        assert!(state.is_ready());

        state.set_ready(false);
        assert!(!state.is_ready());
    }

    #[tokio::test]
    async fn record_round_counts_and_stores() {
        let state = AppState::new(Profile::Daily);
        let report = RoundReport {
            profile: Profile::Daily,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            results: Vec::new(),
        };

        state.record_round(report).await;

        assert_eq!(state.rounds_completed.load(Ordering::SeqCst), 1);
        assert!(state.last_round.read().await.is_some());
    }
}
