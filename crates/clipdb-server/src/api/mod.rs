mod account_metrics;
mod analytics;
mod analytics_images;
mod metrics;
mod planned_content;
mod publications;
mod referents;
mod upload;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{request_id, RequestId};
use crate::vision::VisionService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` when no vision provider is configured.
    pub vision: Option<Arc<VisionService>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    vision: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "payload_too_large" => StatusCode::PAYLOAD_TOO_LARGE,
            "unsupported_media_type" => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "analysis_failed" => StatusCode::UNPROCESSABLE_ENTITY,
            "vision_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &clipdb_db::DbError) -> ApiError {
    if matches!(error, clipdb_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn not_found(request_id: impl Into<String>, what: &str) -> ApiError {
    ApiError::new(request_id, "not_found", format!("{what} not found"))
}

pub(super) fn require_vision(
    state: &AppState,
    request_id: &str,
) -> Result<Arc<VisionService>, ApiError> {
    state.vision.clone().ok_or_else(|| {
        ApiError::new(
            request_id,
            "vision_unavailable",
            "vision analysis is not configured (GEMINI_API_KEY missing)",
        )
    })
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/publications",
            get(publications::list_publications).post(publications::create_publication),
        )
        .route(
            "/api/v1/publications/analyze-video",
            post(publications::analyze_video)
                .layer(DefaultBodyLimit::max(upload::VIDEO_BODY_LIMIT)),
        )
        .route(
            "/api/v1/publications/{id}",
            get(publications::get_publication)
                .put(publications::update_publication)
                .patch(publications::update_publication)
                .delete(publications::delete_publication),
        )
        .route("/api/v1/metrics/{publication_id}", post(metrics::add_metrics))
        .route(
            "/api/v1/metrics/{publication_id}/history",
            get(metrics::metrics_history),
        )
        .route(
            "/api/v1/account-metrics",
            get(account_metrics::list_account_metrics)
                .post(account_metrics::create_account_metrics),
        )
        .route(
            "/api/v1/account-metrics/latest",
            get(account_metrics::latest_account_metrics),
        )
        .route(
            "/api/v1/account-metrics/period",
            get(account_metrics::account_metrics_by_period),
        )
        .route("/api/v1/analytics/overview", get(analytics::overview))
        .route("/api/v1/analytics/hashtags", get(analytics::hashtags))
        .route(
            "/api/v1/analytics/content-types",
            get(analytics::content_types),
        )
        .route("/api/v1/analytics/performance", get(analytics::performance))
        .route(
            "/api/v1/analytics-images/{subject}",
            post(analytics_images::analyze_account_images)
                .layer(DefaultBodyLimit::max(upload::IMAGES_BODY_LIMIT)),
        )
        .route(
            "/api/v1/planned-content",
            get(planned_content::list_planned_content)
                .post(planned_content::create_planned_content),
        )
        .route(
            "/api/v1/planned-content/upcoming",
            get(planned_content::upcoming_content),
        )
        .route(
            "/api/v1/planned-content/status/{status}",
            get(planned_content::planned_content_by_status),
        )
        .route(
            "/api/v1/planned-content/{id}",
            get(planned_content::get_planned_content)
                .put(planned_content::update_planned_content)
                .patch(planned_content::update_planned_content)
                .delete(planned_content::delete_planned_content),
        )
        .route(
            "/api/v1/planned-content/{id}/status",
            patch(planned_content::update_status),
        )
        .route(
            "/api/v1/referents",
            get(referents::list_referents).post(referents::create_referent),
        )
        .route(
            "/api/v1/referents/niche/{niche}",
            get(referents::referents_by_niche),
        )
        .route(
            "/api/v1/referents/{id}",
            get(referents::get_referent)
                .put(referents::update_referent)
                .patch(referents::update_referent)
                .delete(referents::delete_referent),
        )
}

pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .merge(api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors(cors_origins))
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let vision = if state.vision.is_some() {
        "configured"
    } else {
        "disabled"
    };

    match clipdb_db::ping(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::new(
                HealthData {
                    status: "ok",
                    database: "ok",
                    vision,
                },
                req_id.0,
            )),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(
                    HealthData {
                        status: "degraded",
                        database: "unavailable",
                        vision,
                    },
                    req_id.0,
                )),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
