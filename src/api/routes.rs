//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health, metrics, ready, status, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Status endpoint
        .route("/api/v1/status", get(status))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::round::Profile;

    async fn get_status(state: AppState, uri: &str) -> StatusCode {
        create_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let state = AppState::new(Profile::FifteenMin);
        assert_eq!(get_status(state, "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_endpoint_returns_503_when_not_ready() {
        let state = AppState::new(Profile::FifteenMin);
        assert_eq!(get_status(state, "/ready").await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn ready_endpoint_returns_200_when_ready() {
        let state = AppState::new(Profile::FifteenMin);
        state.set_ready(true);
        assert_eq!(get_status(state, "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn status_endpoint_returns_ok() {
        let state = AppState::new(Profile::Daily);
        assert_eq!(get_status(state, "/api/v1/status").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_is_404_without_recorder() {
        let state = AppState::new(Profile::FifteenMin);
        assert_eq!(get_status(state, "/metrics").await, StatusCode::NOT_FOUND);
    }
}
