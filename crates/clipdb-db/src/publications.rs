//! Database operations for the `publications` table.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clipdb_core::{Publication, PublicationWithLatest};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::metrics::{insert_metric_with, MetricRow, NewMetric};
use crate::patch::nullable;
use crate::DbError;

const PUBLICATION_COLUMNS: &str = "id, title, description, content_type, duration_secs, hashtags, \
     sound_name, sound_trending, published_at, video_url, thumbnail_url, script_url, \
     created_at, updated_at";

// ---------------------------------------------------------------------------
// Row and input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
struct PublicationRow {
    id: Uuid,
    title: String,
    description: String,
    content_type: String,
    duration_secs: i32,
    hashtags: Vec<String>,
    sound_name: String,
    sound_trending: bool,
    published_at: DateTime<Utc>,
    video_url: String,
    thumbnail_url: String,
    script_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PublicationRow> for Publication {
    fn from(row: PublicationRow) -> Self {
        Publication {
            id: row.id,
            title: row.title,
            description: row.description,
            content_type: row.content_type,
            duration_secs: row.duration_secs,
            hashtags: row.hashtags,
            sound_name: row.sound_name,
            sound_trending: row.sound_trending,
            published_at: row.published_at,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            script_url: row.script_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A publication with its full snapshot history, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct PublicationWithHistory {
    #[serde(flatten)]
    pub publication: Publication,
    pub metrics: Vec<MetricRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewPublication {
    pub title: String,
    pub description: String,
    pub content_type: String,
    pub duration_secs: i32,
    pub hashtags: Vec<String>,
    pub sound_name: String,
    pub sound_trending: bool,
    /// Defaults to the insert time.
    pub published_at: Option<DateTime<Utc>>,
    pub video_url: String,
    pub thumbnail_url: String,
    pub script_url: Option<String>,
    /// Recorded as the first snapshot when any counter is non-zero.
    pub metrics: Option<NewMetric>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicationPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub duration_secs: Option<i32>,
    pub hashtags: Option<Vec<String>>,
    pub sound_name: Option<String>,
    pub sound_trending: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub script_url: Option<Option<String>>,
}

fn has_counts(metric: &NewMetric) -> bool {
    metric.views + metric.likes + metric.comments + metric.shares + metric.saves > 0
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every publication with its most recent snapshot, newest
/// publication first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn list_publications_with_latest(
    pool: &PgPool,
) -> Result<Vec<PublicationWithLatest>, DbError> {
    let sql = format!("SELECT {PUBLICATION_COLUMNS} FROM publications ORDER BY published_at DESC");
    let rows = sqlx::query_as::<_, PublicationRow>(&sql)
        .fetch_all(pool)
        .await?;

    let latest = sqlx::query_as::<_, MetricRow>(
        "SELECT DISTINCT ON (publication_id) \
                id, publication_id, views, likes, comments, shares, saves, engagement_rate, \
                average_watch_time, viral_score, sound_interactions, recorded_at \
         FROM publication_metrics \
         ORDER BY publication_id, recorded_at DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut latest_by_publication: HashMap<Uuid, MetricRow> = latest
        .into_iter()
        .map(|row| (row.publication_id, row))
        .collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let latest = latest_by_publication
                .remove(&row.id)
                .as_ref()
                .map(MetricRow::snapshot);
            PublicationWithLatest {
                publication: row.into(),
                latest,
            }
        })
        .collect())
}

/// Returns a single publication by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_publication(pool: &PgPool, id: Uuid) -> Result<Option<Publication>, DbError> {
    let sql = format!("SELECT {PUBLICATION_COLUMNS} FROM publications WHERE id = $1");
    let row = sqlx::query_as::<_, PublicationRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Publication::from))
}

/// Returns a publication together with every snapshot, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn get_publication_with_history(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<PublicationWithHistory>, DbError> {
    let Some(publication) = get_publication(pool, id).await? else {
        return Ok(None);
    };
    let metrics = crate::metrics::list_metric_history(pool, id).await?;
    Ok(Some(PublicationWithHistory {
        publication,
        metrics,
    }))
}

/// Inserts a publication and, when the payload carries non-zero counters, its
/// first snapshot stamped with the publication time. Both writes share one
/// transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn create_publication(
    pool: &PgPool,
    input: &NewPublication,
) -> Result<PublicationWithLatest, DbError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "INSERT INTO publications \
           (title, description, content_type, duration_secs, hashtags, sound_name, \
            sound_trending, published_at, video_url, thumbnail_url, script_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, NOW()), $9, $10, $11) \
         RETURNING {PUBLICATION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PublicationRow>(&sql)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.content_type)
        .bind(input.duration_secs)
        .bind(&input.hashtags)
        .bind(&input.sound_name)
        .bind(input.sound_trending)
        .bind(input.published_at)
        .bind(&input.video_url)
        .bind(&input.thumbnail_url)
        .bind(&input.script_url)
        .fetch_one(&mut *tx)
        .await?;

    let mut latest = None;
    if let Some(metric) = input.metrics.as_ref().filter(|m| has_counts(m)) {
        let initial = NewMetric {
            recorded_at: Some(metric.recorded_at.unwrap_or(row.published_at)),
            ..metric.clone()
        };
        latest = insert_metric_with(&mut *tx, row.id, &initial)
            .await?
            .as_ref()
            .map(MetricRow::snapshot);
    }

    tx.commit().await?;
    Ok(PublicationWithLatest {
        publication: row.into(),
        latest,
    })
}

/// Applies a partial update and returns the updated publication.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no publication has this id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_publication(
    pool: &PgPool,
    id: Uuid,
    patch: &PublicationPatch,
) -> Result<Publication, DbError> {
    let script_url_supplied = patch.script_url.is_some();
    let script_url_val = patch.script_url.clone().flatten();

    let sql = format!(
        "UPDATE publications \
         SET title          = COALESCE($2, title), \
             description    = COALESCE($3, description), \
             content_type   = COALESCE($4, content_type), \
             duration_secs  = COALESCE($5, duration_secs), \
             hashtags       = COALESCE($6, hashtags), \
             sound_name     = COALESCE($7, sound_name), \
             sound_trending = COALESCE($8, sound_trending), \
             published_at   = COALESCE($9, published_at), \
             video_url      = COALESCE($10, video_url), \
             thumbnail_url  = COALESCE($11, thumbnail_url), \
             script_url     = CASE WHEN $12::BOOL THEN $13 ELSE script_url END, \
             updated_at     = NOW() \
         WHERE id = $1 \
         RETURNING {PUBLICATION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PublicationRow>(&sql)
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.content_type)
        .bind(patch.duration_secs)
        .bind(&patch.hashtags)
        .bind(&patch.sound_name)
        .bind(patch.sound_trending)
        .bind(patch.published_at)
        .bind(&patch.video_url)
        .bind(&patch.thumbnail_url)
        .bind(script_url_supplied)
        .bind(script_url_val)
        .fetch_optional(pool)
        .await?;

    row.map(Publication::from).ok_or(DbError::NotFound)
}

/// Deletes a publication; its snapshots go with it (`ON DELETE CASCADE`).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no publication has this id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn delete_publication(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM publications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_cleared_script_url() {
        let cleared: PublicationPatch =
            serde_json::from_str(r#"{"script_url": null}"#).unwrap();
        assert_eq!(cleared.script_url, Some(None));

        let untouched: PublicationPatch = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(untouched.script_url, None);
        assert_eq!(untouched.title.as_deref(), Some("x"));
    }

    #[test]
    fn initial_metrics_require_some_counts() {
        assert!(!has_counts(&NewMetric::default()));
        assert!(has_counts(&NewMetric {
            saves: 1,
            ..NewMetric::default()
        }));
    }
}
