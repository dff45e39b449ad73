use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use clipdb_core::NewAccountMetrics;
use clipdb_db::AccountMetricsRow;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_db_error, not_found, ApiError, ApiResponse, AppState};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PeriodQuery {
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

pub(super) async fn list_account_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<AccountMetricsRow>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let rows = clipdb_db::list_account_metrics(&state.pool, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn latest_account_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<AccountMetricsRow>>, ApiError> {
    let row = clipdb_db::get_latest_account_metrics(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(req_id.0.clone(), "account metrics"))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// GET /api/v1/account-metrics/period?start_date=..&end_date=..
///
/// Returns snapshots whose period lies entirely inside the range.
pub(super) async fn account_metrics_by_period(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<ApiResponse<Vec<AccountMetricsRow>>>, ApiError> {
    if query.start_date > query.end_date {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "start_date must not be after end_date",
        ));
    }
    let rows =
        clipdb_db::list_account_metrics_by_period(&state.pool, query.start_date, query.end_date)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn create_account_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NewAccountMetrics>,
) -> Result<(StatusCode, Json<ApiResponse<AccountMetricsRow>>), ApiError> {
    if !body.has_valid_period() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "period_start and period_end are required and must be ordered",
        ));
    }

    let row = clipdb_db::create_account_metrics(&state.pool, &body)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(account_metrics_id = %row.id, "account metrics recorded");

    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}
