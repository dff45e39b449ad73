use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use clipdb_db::{NewReferent, ReferentPatch, ReferentRow};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, not_found, publications::DeletedResponse, ApiError, ApiResponse, AppState,
};

fn blank(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().is_empty())
}

pub(super) async fn list_referents(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ReferentRow>>>, ApiError> {
    let rows = clipdb_db::list_referents(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn get_referent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReferentRow>>, ApiError> {
    let row = clipdb_db::get_referent(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(req_id.0.clone(), "referent"))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// GET /api/v1/referents/niche/{niche}: case-insensitive substring match,
/// best engagement first.
pub(super) async fn referents_by_niche(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(niche): Path<String>,
) -> Result<Json<ApiResponse<Vec<ReferentRow>>>, ApiError> {
    let rows = clipdb_db::list_referents_by_niche(&state.pool, niche.trim())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn create_referent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NewReferent>,
) -> Result<(StatusCode, Json<ApiResponse<ReferentRow>>), ApiError> {
    if [&body.url, &body.username, &body.niche]
        .iter()
        .any(|v| v.trim().is_empty())
    {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "url, username and niche are required",
        ));
    }

    let row = clipdb_db::create_referent(&state.pool, &body)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(referent_id = %row.id, username = %row.username, "referent added");

    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

pub(super) async fn update_referent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReferentPatch>,
) -> Result<Json<ApiResponse<ReferentRow>>, ApiError> {
    if blank(body.url.as_deref()) || blank(body.username.as_deref()) || blank(body.niche.as_deref())
    {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "url, username and niche must not be empty",
        ));
    }
    let row = clipdb_db::update_referent(&state.pool, id, &body)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

pub(super) async fn delete_referent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    clipdb_db::delete_referent(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(DeletedResponse::yes(), req_id.0)))
}
