use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use clipdb_core::{Publication, PublicationWithLatest};
use clipdb_db::{NewPublication, PublicationPatch, PublicationWithHistory};
use clipdb_vision::ExtractionResult;
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, not_found, require_vision, upload, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct DeletedResponse {
    deleted: bool,
}

impl DeletedResponse {
    pub(super) fn yes() -> Self {
        Self { deleted: true }
    }
}

fn validate_new_publication(rid: &str, input: &NewPublication) -> Result<(), ApiError> {
    if input.title.trim().is_empty() || input.content_type.trim().is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "title and content_type are required",
        ));
    }
    if input.duration_secs < 0 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "duration_secs must not be negative",
        ));
    }
    if input.metrics.as_ref().is_some_and(|m| m.has_negative_counts()) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "metric counts must not be negative",
        ));
    }
    Ok(())
}

/// GET /api/v1/publications: every publication with its latest snapshot.
pub(super) async fn list_publications(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<PublicationWithLatest>>>, ApiError> {
    let rows = clipdb_db::list_publications_with_latest(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

/// GET /api/v1/publications/{id}: one publication with its full history.
pub(super) async fn get_publication(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PublicationWithHistory>>, ApiError> {
    let row = clipdb_db::get_publication_with_history(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(req_id.0.clone(), "publication"))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// POST /api/v1/publications
pub(super) async fn create_publication(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NewPublication>,
) -> Result<(StatusCode, Json<ApiResponse<PublicationWithLatest>>), ApiError> {
    validate_new_publication(&req_id.0, &body)?;

    let created = clipdb_db::create_publication(&state.pool, &body)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(
        publication_id = %created.publication.id,
        with_metrics = created.latest.is_some(),
        "publication created"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::new(created, req_id.0))))
}

/// PUT|PATCH /api/v1/publications/{id}: sparse update.
pub(super) async fn update_publication(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<PublicationPatch>,
) -> Result<Json<ApiResponse<Publication>>, ApiError> {
    let rid = &req_id.0;
    if body.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::new(rid, "validation_error", "title must not be empty"));
    }
    if body.duration_secs.is_some_and(|d| d < 0) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "duration_secs must not be negative",
        ));
    }

    let updated = clipdb_db::update_publication(&state.pool, id, &body)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok(Json(ApiResponse::new(updated, req_id.0)))
}

/// DELETE /api/v1/publications/{id}: removes the publication and its history.
pub(super) async fn delete_publication(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    clipdb_db::delete_publication(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(publication_id = %id, "publication deleted");
    Ok(Json(ApiResponse::new(DeletedResponse::yes(), req_id.0)))
}

/// POST /api/v1/publications/analyze-video: multipart `video` field.
///
/// Runs the upload/poll/extract cycle synchronously and returns the
/// extraction result; nothing is persisted.
pub(super) async fn analyze_video(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ExtractionResult>>, ApiError> {
    let rid = &req_id.0;
    let vision = require_vision(&state, rid)?;
    let video = upload::read_video(multipart, rid).await?;

    let result = vision
        .video_analyzer()
        .analyze(&video.bytes, &video.file_name)
        .await;

    if let Some(failure) = result.as_failure() {
        tracing::warn!(
            file_name = %video.file_name,
            kind = %failure.kind,
            reason = %failure.reason,
            "video analysis failed"
        );
        return Err(ApiError::new(
            rid,
            "analysis_failed",
            format!("{}: {}", failure.kind, failure.reason),
        ));
    }

    Ok(Json(ApiResponse::new(result, req_id.0)))
}
