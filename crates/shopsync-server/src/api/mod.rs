mod sync;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use shopsync_sync::{SyncError, Syncer};

use crate::middleware::request_id;

#[derive(Clone)]
pub struct AppState {
    pub syncer: Arc<Syncer>,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

/// Error envelope: a short generic message plus the underlying detail.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                details: details.into(),
            },
        }
    }

    /// Maps a pipeline failure onto the wire, logging it with its cause.
    pub(super) fn from_sync_error(request_id: &str, error: &SyncError) -> Self {
        let (status, message) = match error {
            SyncError::InvalidAction(_) => (StatusCode::BAD_REQUEST, "Invalid action"),
            SyncError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
            SyncError::UpstreamFetchFailure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch data from Shopify",
            ),
            SyncError::TransactionFailure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to commit Sanity transaction",
            ),
            SyncError::MalformedIdentifier(_)
            | SyncError::StoreQueryFailure(_)
            | SyncError::Encode { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process sync request",
            ),
        };

        if error.is_client_error() {
            tracing::warn!(request_id, error = %error, "sync request rejected");
        } else {
            tracing::error!(
                request_id,
                error = %error,
                cause = ?std::error::Error::source(error).map(ToString::to_string),
                "sync request failed"
            );
        }
        Self::new(status, message, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn build_app(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/api/v1/sync",
            post(sync::handle).fallback(method_not_allowed),
        )
        .route("/api/v1/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_id))
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .with_state(state)
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed",
        "only POST is accepted on this endpoint",
    )
}

async fn health() -> impl IntoResponse {
    Json(HealthData {
        status: "ok",
        timestamp: Utc::now(),
    })
}
