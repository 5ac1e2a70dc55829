use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};

use shopsync_sync::SyncRequest;

use super::{ApiError, AppState, MessageBody};
use crate::middleware::RequestId;

/// `POST /api/v1/sync`: applies one webhook body as a single transaction.
pub(super) async fn handle(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(request_id = %req_id.0, error = %rejection, "rejected sync body");
        let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        };
        ApiError::new(status, "Invalid request body", rejection.body_text())
    })?;

    match state.syncer.run(request).await {
        Ok(summary) => {
            tracing::info!(
                request_id = %req_id.0,
                mutations = summary.mutations,
                transaction_id = summary.transaction_id.as_deref().unwrap_or("-"),
                "sync completed"
            );
            Ok(Json(MessageBody { message: "OK" }))
        }
        Err(e) => Err(ApiError::from_sync_error(&req_id.0, &e)),
    }
}
