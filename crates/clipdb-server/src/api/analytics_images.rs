//! Account analytics from screenshots: extract, merge, persist.

use std::str::FromStr;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use clipdb_db::AccountMetricsRow;
use clipdb_vision::{account_metrics_from, AccountSubject, ImageBatchAnalysis};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, not_found, require_vision, upload, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct AccountImagesResponse {
    analysis: ImageBatchAnalysis,
    saved_metrics: AccountMetricsRow,
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_period_bound(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn required_bound(
    fields: &std::collections::HashMap<String, String>,
    name: &str,
    rid: &str,
) -> Result<DateTime<Utc>, ApiError> {
    let raw = fields
        .get(name)
        .ok_or_else(|| ApiError::new(rid, "validation_error", format!("{name} is required")))?;
    parse_period_bound(raw).ok_or_else(|| {
        ApiError::new(
            rid,
            "validation_error",
            format!("{name} must be an RFC 3339 timestamp or YYYY-MM-DD date"),
        )
    })
}

/// POST /api/v1/analytics-images/{subject}
///
/// `subject` is `profile`, `viewers` or `followers`. The form carries
/// `images[]` plus `period_start` and `period_end`. The period is checked
/// before any provider call.
pub(super) async fn analyze_account_images(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(subject): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<AccountImagesResponse>>), ApiError> {
    let rid = req_id.0.as_str();
    let subject = AccountSubject::from_str(&subject).map_err(|_| not_found(rid, "analysis subject"))?;
    let vision = require_vision(&state, rid)?;

    let form = upload::read_image_form(multipart, rid).await?;
    if form.images.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "at least one image is required",
        ));
    }
    let period_start = required_bound(&form.fields, "period_start", rid)?;
    let period_end = required_bound(&form.fields, "period_end", rid)?;
    if period_start > period_end {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "period_start must not be after period_end",
        ));
    }

    let analysis = vision
        .extractor()
        .analyze_images(subject.task(), form.images)
        .await;
    if !analysis
        .combined_result
        .has_any_field(subject.expected_fields())
    {
        tracing::warn!(
            %subject,
            images = analysis.individual_results.len(),
            succeeded = analysis.success_count(),
            "no usable data extracted from screenshots"
        );
        return Err(ApiError::new(
            rid,
            "analysis_failed",
            format!("no {subject} data could be extracted from the images"),
        ));
    }

    let record = account_metrics_from(subject, &analysis.combined_result, period_start, period_end);
    let saved_metrics = clipdb_db::create_account_metrics(&state.pool, &record)
        .await
        .map_err(|e| map_db_error(rid.to_string(), &e))?;
    tracing::info!(
        %subject,
        account_metrics_id = %saved_metrics.id,
        "account metrics saved from screenshots"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            AccountImagesResponse {
                analysis,
                saved_metrics,
            },
            req_id.0,
        )),
    ))
}
