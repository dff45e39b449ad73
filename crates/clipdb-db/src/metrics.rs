//! Database operations for the `publication_metrics` table.

use chrono::{DateTime, Utc};
use clipdb_core::{engagement_rate, MetricSnapshot};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::DbError;

const METRIC_COLUMNS: &str = "id, publication_id, views, likes, comments, shares, saves, \
     engagement_rate, average_watch_time, viral_score, sound_interactions, recorded_at";

// ---------------------------------------------------------------------------
// Row and input types
// ---------------------------------------------------------------------------

/// A row from the `publication_metrics` table.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct MetricRow {
    pub id: Uuid,
    pub publication_id: Uuid,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub saves: i64,
    pub engagement_rate: f64,
    pub average_watch_time: f64,
    pub viral_score: f64,
    pub sound_interactions: i64,
    pub recorded_at: DateTime<Utc>,
}

impl MetricRow {
    #[must_use]
    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            views: self.views,
            likes: self.likes,
            comments: self.comments,
            shares: self.shares,
            saves: self.saves,
            engagement_rate: self.engagement_rate,
            average_watch_time: self.average_watch_time,
            viral_score: self.viral_score,
            sound_interactions: self.sound_interactions,
            recorded_at: self.recorded_at,
        }
    }
}

/// A new observation. The engagement rate is derived, never supplied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewMetric {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub saves: i64,
    pub average_watch_time: f64,
    pub viral_score: f64,
    pub sound_interactions: i64,
    /// Defaults to the insert time.
    pub recorded_at: Option<DateTime<Utc>>,
}

impl NewMetric {
    #[must_use]
    pub fn engagement_rate(&self) -> f64 {
        engagement_rate(self.views, self.likes, self.comments, self.shares, self.saves)
    }

    /// Negative counters are rejected before they reach the database.
    #[must_use]
    pub fn has_negative_counts(&self) -> bool {
        [
            self.views,
            self.likes,
            self.comments,
            self.shares,
            self.saves,
            self.sound_interactions,
        ]
        .iter()
        .any(|v| *v < 0)
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Records a snapshot for a publication, computing its engagement rate.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the publication does not exist, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn insert_metric(
    pool: &PgPool,
    publication_id: Uuid,
    metric: &NewMetric,
) -> Result<MetricRow, DbError> {
    insert_metric_with(pool, publication_id, metric)
        .await?
        .ok_or(DbError::NotFound)
}

pub(crate) async fn insert_metric_with<'e>(
    executor: impl PgExecutor<'e>,
    publication_id: Uuid,
    metric: &NewMetric,
) -> Result<Option<MetricRow>, DbError> {
    let sql = format!(
        "INSERT INTO publication_metrics \
           (publication_id, views, likes, comments, shares, saves, engagement_rate, \
            average_watch_time, viral_score, sound_interactions, recorded_at) \
         SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, NOW()) \
         WHERE EXISTS (SELECT 1 FROM publications WHERE id = $1) \
         RETURNING {METRIC_COLUMNS}"
    );
    let row = sqlx::query_as::<_, MetricRow>(&sql)
        .bind(publication_id)
        .bind(metric.views)
        .bind(metric.likes)
        .bind(metric.comments)
        .bind(metric.shares)
        .bind(metric.saves)
        .bind(metric.engagement_rate())
        .bind(metric.average_watch_time)
        .bind(metric.viral_score)
        .bind(metric.sound_interactions)
        .bind(metric.recorded_at)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

/// Returns every snapshot of a publication, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_metric_history(
    pool: &PgPool,
    publication_id: Uuid,
) -> Result<Vec<MetricRow>, DbError> {
    let sql = format!(
        "SELECT {METRIC_COLUMNS} FROM publication_metrics \
         WHERE publication_id = $1 \
         ORDER BY recorded_at DESC"
    );
    let rows = sqlx::query_as::<_, MetricRow>(&sql)
        .bind(publication_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Returns all snapshots recorded at or after `since`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_metrics_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<MetricRow>, DbError> {
    let sql = format!(
        "SELECT {METRIC_COLUMNS} FROM publication_metrics \
         WHERE recorded_at >= $1 \
         ORDER BY recorded_at ASC"
    );
    let rows = sqlx::query_as::<_, MetricRow>(&sql)
        .bind(since)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
