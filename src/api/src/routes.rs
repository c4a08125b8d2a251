//! API route handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::pipeline::{parse_run_date, run_daily};
use crate::scraper::{HttpFetcher, PayoutScraper};
use crate::storage::LocalStore;
use crate::types::{ErrorResponse, HealthResponse, RunQuery, RunResponse};

/// Application state shared across handlers.
pub struct AppState {
    pub config: AppConfig,
    pub scraper: PayoutScraper<HttpFetcher>,
    pub store: Arc<LocalStore>,
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Daily run endpoint: scrape, store and judge one date.
pub async fn run(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunQuery>,
) -> Result<Json<RunResponse>, ApiError> {
    let date = parse_run_date(query.date.as_deref()).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let response = run_daily(&state.scraper, Arc::clone(&state.store), &state.config, date)
        .await
        .map_err(|e| ApiError::internal(format!("Daily run failed: {:#}", e)))?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::RateLimiter;

    #[test]
    fn test_api_error_status() {
        let response = ApiError::bad_request("Invalid date").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::internal("disk full").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_run_rejects_bad_date() {
        let config = AppConfig::default();
        let fetcher = HttpFetcher::new(&config.scrape.user_agent, config.scrape.timeout()).unwrap();
        let state = Arc::new(AppState {
            scraper: PayoutScraper::new(fetcher, RateLimiter::from_secs(0.0), "http://127.0.0.1:9"),
            store: Arc::new(LocalStore::new("results", "predictions")),
            config,
        });

        let query = RunQuery {
            date: Some("2025/10/15".to_string()),
        };
        let err = run(State(state), Query(query)).await.unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("2025/10/15"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(health) = health().await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }
}
