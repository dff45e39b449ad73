//! Database operations for the `account_metrics` table.

use chrono::{DateTime, Utc};
use clipdb_core::NewAccountMetrics;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const ACCOUNT_METRICS_COLUMNS: &str = "id, video_views, profile_views, profile_views_change, \
     total_viewers, total_viewers_change, new_viewers, new_viewers_change, \
     total_followers, total_followers_change, net_followers, net_followers_change, \
     for_you_traffic_percent, personal_profile_percent, search_traffic_percent, \
     following_traffic_percent, sound_traffic_percent, \
     male_gender_percent, female_gender_percent, other_gender_percent, \
     search_queries, age_ranges, top_locations, most_active_times_viewers, \
     most_active_times_followers, creators_also_watched, \
     period_start, period_end, recorded_at";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `account_metrics` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AccountMetricsRow {
    pub id: Uuid,
    pub video_views: Option<i64>,
    pub profile_views: Option<i64>,
    pub profile_views_change: Option<f64>,
    pub total_viewers: Option<i64>,
    pub total_viewers_change: Option<f64>,
    pub new_viewers: Option<i64>,
    pub new_viewers_change: Option<f64>,
    pub total_followers: Option<i64>,
    pub total_followers_change: Option<f64>,
    pub net_followers: Option<i64>,
    pub net_followers_change: Option<f64>,
    pub for_you_traffic_percent: Option<f64>,
    pub personal_profile_percent: Option<f64>,
    pub search_traffic_percent: Option<f64>,
    pub following_traffic_percent: Option<f64>,
    pub sound_traffic_percent: Option<f64>,
    pub male_gender_percent: Option<f64>,
    pub female_gender_percent: Option<f64>,
    pub other_gender_percent: Option<f64>,
    pub search_queries: Option<Value>,
    pub age_ranges: Option<Value>,
    pub top_locations: Option<Value>,
    pub most_active_times_viewers: Option<Value>,
    pub most_active_times_followers: Option<Value>,
    pub creators_also_watched: Option<Value>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns up to `limit` snapshots, most recently recorded first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_account_metrics(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<AccountMetricsRow>, DbError> {
    let sql = format!(
        "SELECT {ACCOUNT_METRICS_COLUMNS} FROM account_metrics \
         ORDER BY recorded_at DESC \
         LIMIT $1"
    );
    let rows = sqlx::query_as::<_, AccountMetricsRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Returns the most recently recorded snapshot, or `None` when the table is
/// empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_latest_account_metrics(
    pool: &PgPool,
) -> Result<Option<AccountMetricsRow>, DbError> {
    let sql = format!(
        "SELECT {ACCOUNT_METRICS_COLUMNS} FROM account_metrics \
         ORDER BY recorded_at DESC \
         LIMIT 1"
    );
    let row = sqlx::query_as::<_, AccountMetricsRow>(&sql)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Returns snapshots whose reporting period lies within `[start, end]`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_account_metrics_by_period(
    pool: &PgPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<AccountMetricsRow>, DbError> {
    let sql = format!(
        "SELECT {ACCOUNT_METRICS_COLUMNS} FROM account_metrics \
         WHERE period_start >= $1 AND period_end <= $2 \
         ORDER BY recorded_at DESC"
    );
    let rows = sqlx::query_as::<_, AccountMetricsRow>(&sql)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Inserts one snapshot.
///
/// The caller must have checked [`NewAccountMetrics::has_valid_period`]; a
/// missing bound fails the `NOT NULL` constraint.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_account_metrics(
    pool: &PgPool,
    metrics: &NewAccountMetrics,
) -> Result<AccountMetricsRow, DbError> {
    let sql = format!(
        "INSERT INTO account_metrics \
           (video_views, profile_views, profile_views_change, \
            total_viewers, total_viewers_change, new_viewers, new_viewers_change, \
            total_followers, total_followers_change, net_followers, net_followers_change, \
            for_you_traffic_percent, personal_profile_percent, search_traffic_percent, \
            following_traffic_percent, sound_traffic_percent, \
            male_gender_percent, female_gender_percent, other_gender_percent, \
            search_queries, age_ranges, top_locations, most_active_times_viewers, \
            most_active_times_followers, creators_also_watched, period_start, period_end) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                 $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27) \
         RETURNING {ACCOUNT_METRICS_COLUMNS}"
    );
    let row = sqlx::query_as::<_, AccountMetricsRow>(&sql)
        .bind(metrics.video_views)
        .bind(metrics.profile_views)
        .bind(metrics.profile_views_change)
        .bind(metrics.total_viewers)
        .bind(metrics.total_viewers_change)
        .bind(metrics.new_viewers)
        .bind(metrics.new_viewers_change)
        .bind(metrics.total_followers)
        .bind(metrics.total_followers_change)
        .bind(metrics.net_followers)
        .bind(metrics.net_followers_change)
        .bind(metrics.for_you_traffic_percent)
        .bind(metrics.personal_profile_percent)
        .bind(metrics.search_traffic_percent)
        .bind(metrics.following_traffic_percent)
        .bind(metrics.sound_traffic_percent)
        .bind(metrics.male_gender_percent)
        .bind(metrics.female_gender_percent)
        .bind(metrics.other_gender_percent)
        .bind(&metrics.search_queries)
        .bind(&metrics.age_ranges)
        .bind(&metrics.top_locations)
        .bind(&metrics.most_active_times_viewers)
        .bind(&metrics.most_active_times_followers)
        .bind(&metrics.creators_also_watched)
        .bind(metrics.period_start)
        .bind(metrics.period_end)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Deletes every account snapshot and returns how many were removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_all_account_metrics(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM account_metrics")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
