//! Database operations for the `planned_content` table.

use chrono::{DateTime, Duration, Utc};
use clipdb_core::ContentStatus;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::patch::nullable;
use crate::DbError;

const PLANNED_COLUMNS: &str = "id, title, description, content_type, hashtags, sound_idea, \
     scheduled_date, status, estimated_views, notes, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row and input types
// ---------------------------------------------------------------------------

/// A row from the `planned_content` table.
///
/// `status` is constrained in the schema to the [`ContentStatus`] names.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlannedContentRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub content_type: String,
    pub hashtags: Vec<String>,
    pub sound_idea: Option<String>,
    pub scheduled_date: DateTime<Utc>,
    pub status: String,
    pub estimated_views: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlannedContent {
    pub title: String,
    pub description: Option<String>,
    pub content_type: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub sound_idea: Option<String>,
    pub scheduled_date: DateTime<Utc>,
    /// Defaults to `planned`.
    pub status: Option<ContentStatus>,
    pub estimated_views: Option<i64>,
    pub notes: Option<String>,
}

/// Partial update. Absent fields keep their stored value; `null` clears a
/// nullable column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannedContentPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub content_type: Option<String>,
    pub hashtags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub sound_idea: Option<Option<String>>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub status: Option<ContentStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_views: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all planned content, soonest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_planned_content(pool: &PgPool) -> Result<Vec<PlannedContentRow>, DbError> {
    let sql = format!("SELECT {PLANNED_COLUMNS} FROM planned_content ORDER BY scheduled_date ASC");
    let rows = sqlx::query_as::<_, PlannedContentRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Returns a single item by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_planned_content(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<PlannedContentRow>, DbError> {
    let sql = format!("SELECT {PLANNED_COLUMNS} FROM planned_content WHERE id = $1");
    let row = sqlx::query_as::<_, PlannedContentRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Returns items in the given status, soonest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_planned_content_by_status(
    pool: &PgPool,
    status: ContentStatus,
) -> Result<Vec<PlannedContentRow>, DbError> {
    let sql = format!(
        "SELECT {PLANNED_COLUMNS} FROM planned_content \
         WHERE status = $1 \
         ORDER BY scheduled_date ASC"
    );
    let rows = sqlx::query_as::<_, PlannedContentRow>(&sql)
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Returns unpublished items scheduled between `now` and `now + days`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_upcoming_content(
    pool: &PgPool,
    now: DateTime<Utc>,
    days: u32,
) -> Result<Vec<PlannedContentRow>, DbError> {
    let until = now + Duration::days(i64::from(days));
    let pending: Vec<&str> = ContentStatus::ALL
        .into_iter()
        .filter(|s| s.is_pending())
        .map(ContentStatus::as_str)
        .collect();

    let sql = format!(
        "SELECT {PLANNED_COLUMNS} FROM planned_content \
         WHERE scheduled_date >= $1 AND scheduled_date <= $2 AND status = ANY($3) \
         ORDER BY scheduled_date ASC"
    );
    let rows = sqlx::query_as::<_, PlannedContentRow>(&sql)
        .bind(now)
        .bind(until)
        .bind(&pending)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Inserts a planned item and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_planned_content(
    pool: &PgPool,
    input: &NewPlannedContent,
) -> Result<PlannedContentRow, DbError> {
    let sql = format!(
        "INSERT INTO planned_content \
           (title, description, content_type, hashtags, sound_idea, scheduled_date, status, \
            estimated_views, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'planned'), $8, $9) \
         RETURNING {PLANNED_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PlannedContentRow>(&sql)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.content_type)
        .bind(&input.hashtags)
        .bind(&input.sound_idea)
        .bind(input.scheduled_date)
        .bind(input.status.map(ContentStatus::as_str))
        .bind(input.estimated_views)
        .bind(&input.notes)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Applies a partial update and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no item has this id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_planned_content(
    pool: &PgPool,
    id: Uuid,
    patch: &PlannedContentPatch,
) -> Result<PlannedContentRow, DbError> {
    let description_supplied = patch.description.is_some();
    let description_val = patch.description.clone().flatten();
    let sound_idea_supplied = patch.sound_idea.is_some();
    let sound_idea_val = patch.sound_idea.clone().flatten();
    let estimated_views_supplied = patch.estimated_views.is_some();
    let estimated_views_val = patch.estimated_views.flatten();
    let notes_supplied = patch.notes.is_some();
    let notes_val = patch.notes.clone().flatten();

    let sql = format!(
        "UPDATE planned_content \
         SET title           = COALESCE($2, title), \
             content_type    = COALESCE($3, content_type), \
             hashtags        = COALESCE($4, hashtags), \
             scheduled_date  = COALESCE($5, scheduled_date), \
             status          = COALESCE($6, status), \
             description     = CASE WHEN $7::BOOL  THEN $8  ELSE description END, \
             sound_idea      = CASE WHEN $9::BOOL  THEN $10 ELSE sound_idea END, \
             estimated_views = CASE WHEN $11::BOOL THEN $12 ELSE estimated_views END, \
             notes           = CASE WHEN $13::BOOL THEN $14 ELSE notes END, \
             updated_at      = NOW() \
         WHERE id = $1 \
         RETURNING {PLANNED_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PlannedContentRow>(&sql)
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.content_type)
        .bind(&patch.hashtags)
        .bind(patch.scheduled_date)
        .bind(patch.status.map(ContentStatus::as_str))
        .bind(description_supplied)
        .bind(description_val)
        .bind(sound_idea_supplied)
        .bind(sound_idea_val)
        .bind(estimated_views_supplied)
        .bind(estimated_views_val)
        .bind(notes_supplied)
        .bind(notes_val)
        .fetch_optional(pool)
        .await?;

    row.ok_or(DbError::NotFound)
}

/// Sets only the status of an item.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no item has this id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_planned_content_status(
    pool: &PgPool,
    id: Uuid,
    status: ContentStatus,
) -> Result<PlannedContentRow, DbError> {
    let sql = format!(
        "UPDATE planned_content \
         SET status = $2, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {PLANNED_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PlannedContentRow>(&sql)
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a planned item.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no item has this id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn delete_planned_content(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM planned_content WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
