//! Read-only aggregates over publications and their snapshots.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};
use clipdb_analytics::{ContentTypeStats, DailyPerformance, HashtagStats, Overview};
use clipdb_core::PublicationWithLatest;
use clipdb_db::MetricRow;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

const DEFAULT_WINDOW_DAYS: u32 = 30;
const MAX_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Deserialize)]
pub(super) struct PerformanceQuery {
    days: Option<u32>,
}

async fn load_publications(
    state: &AppState,
    request_id: &str,
) -> Result<Vec<PublicationWithLatest>, ApiError> {
    clipdb_db::list_publications_with_latest(&state.pool)
        .await
        .map_err(|e| map_db_error(request_id.to_string(), &e))
}

pub(super) async fn overview(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Overview>>, ApiError> {
    let publications = load_publications(&state, &req_id.0).await?;
    Ok(Json(ApiResponse::new(
        clipdb_analytics::overview(&publications),
        req_id.0,
    )))
}

pub(super) async fn hashtags(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<HashtagStats>>>, ApiError> {
    let publications = load_publications(&state, &req_id.0).await?;
    Ok(Json(ApiResponse::new(
        clipdb_analytics::hashtag_analysis(&publications),
        req_id.0,
    )))
}

pub(super) async fn content_types(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ContentTypeStats>>>, ApiError> {
    let publications = load_publications(&state, &req_id.0).await?;
    Ok(Json(ApiResponse::new(
        clipdb_analytics::content_type_analysis(&publications),
        req_id.0,
    )))
}

/// GET /api/v1/analytics/performance?days=N: daily totals over the window.
pub(super) async fn performance(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PerformanceQuery>,
) -> Result<Json<ApiResponse<Vec<DailyPerformance>>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("days must be between 1 and {MAX_WINDOW_DAYS}"),
        ));
    }

    let now = Utc::now();
    let rows = clipdb_db::list_metrics_since(&state.pool, now - Duration::days(i64::from(days)))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let snapshots: Vec<_> = rows.iter().map(MetricRow::snapshot).collect();

    Ok(Json(ApiResponse::new(
        clipdb_analytics::performance_by_day(&snapshots, days, now),
        req_id.0,
    )))
}
