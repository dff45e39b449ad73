use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use clipdb_core::ContentStatus;
use clipdb_db::{NewPlannedContent, PlannedContentPatch, PlannedContentRow};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, not_found, publications::DeletedResponse, ApiError, ApiResponse, AppState,
};

const DEFAULT_UPCOMING_DAYS: u32 = 7;
const MAX_UPCOMING_DAYS: u32 = 365;

#[derive(Debug, Deserialize)]
pub(super) struct UpcomingQuery {
    days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusBody {
    status: ContentStatus,
}

fn parse_status(rid: &str, raw: &str) -> Result<ContentStatus, ApiError> {
    ContentStatus::from_str(raw).map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))
}

pub(super) async fn list_planned_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<PlannedContentRow>>>, ApiError> {
    let rows = clipdb_db::list_planned_content(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn get_planned_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PlannedContentRow>>, ApiError> {
    let row = clipdb_db::get_planned_content(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(req_id.0.clone(), "planned content"))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

pub(super) async fn planned_content_by_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(status): Path<String>,
) -> Result<Json<ApiResponse<Vec<PlannedContentRow>>>, ApiError> {
    let status = parse_status(&req_id.0, &status)?;
    let rows = clipdb_db::list_planned_content_by_status(&state.pool, status)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

/// GET /api/v1/planned-content/upcoming?days=N: unpublished items due
/// within the next `N` days (default 7).
pub(super) async fn upcoming_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<ApiResponse<Vec<PlannedContentRow>>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    if days > MAX_UPCOMING_DAYS {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("days must be at most {MAX_UPCOMING_DAYS}"),
        ));
    }
    let rows = clipdb_db::list_upcoming_content(&state.pool, Utc::now(), days)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn create_planned_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NewPlannedContent>,
) -> Result<(StatusCode, Json<ApiResponse<PlannedContentRow>>), ApiError> {
    if body.title.trim().is_empty() || body.content_type.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "title and content_type are required",
        ));
    }
    if body.estimated_views.is_some_and(|v| v < 0) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "estimated_views must not be negative",
        ));
    }

    let row = clipdb_db::create_planned_content(&state.pool, &body)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(planned_content_id = %row.id, status = %row.status, "planned content created");

    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

pub(super) async fn update_planned_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<PlannedContentPatch>,
) -> Result<Json<ApiResponse<PlannedContentRow>>, ApiError> {
    if body.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "title must not be empty",
        ));
    }
    let row = clipdb_db::update_planned_content(&state.pool, id, &body)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// PATCH /api/v1/planned-content/{id}/status: body `{"status": "ready"}`.
pub(super) async fn update_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> Result<Json<ApiResponse<PlannedContentRow>>, ApiError> {
    let row = clipdb_db::update_planned_content_status(&state.pool, id, body.status)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(planned_content_id = %id, status = %body.status, "planned content status changed");
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

pub(super) async fn delete_planned_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    clipdb_db::delete_planned_content(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(DeletedResponse::yes(), req_id.0)))
}
