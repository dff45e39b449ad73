use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use clipdb_db::{MetricRow, NewMetric};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, not_found, ApiError, ApiResponse, AppState};

/// POST /api/v1/metrics/{publication_id}: record a snapshot.
///
/// The engagement rate is computed from the counters, saves included.
pub(super) async fn add_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(publication_id): Path<Uuid>,
    Json(body): Json<NewMetric>,
) -> Result<(StatusCode, Json<ApiResponse<MetricRow>>), ApiError> {
    let rid = &req_id.0;
    if body.has_negative_counts() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "metric counts must not be negative",
        ));
    }

    let row = clipdb_db::insert_metric(&state.pool, publication_id, &body)
        .await
        .map_err(|e| match e {
            clipdb_db::DbError::NotFound => not_found(rid.clone(), "publication"),
            other => map_db_error(rid.clone(), &other),
        })?;
    tracing::info!(
        %publication_id,
        views = row.views,
        engagement_rate = row.engagement_rate,
        "metrics recorded"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

/// GET /api/v1/metrics/{publication_id}/history: newest first.
pub(super) async fn metrics_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(publication_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<MetricRow>>>, ApiError> {
    let rid = &req_id.0;
    clipdb_db::get_publication(&state.pool, publication_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid.clone(), "publication"))?;

    let rows = clipdb_db::list_metric_history(&state.pool, publication_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}
