//! Database operations for the `referents` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::patch::nullable;
use crate::DbError;

const REFERENT_COLUMNS: &str =
    "id, url, username, followers, avg_views, engagement_rate, niche, notes, added_at, updated_at";

// ---------------------------------------------------------------------------
// Row and input types
// ---------------------------------------------------------------------------

/// A row from the `referents` table: a creator tracked for comparison.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReferentRow {
    pub id: Uuid,
    pub url: String,
    pub username: String,
    pub followers: i64,
    pub avg_views: i64,
    pub engagement_rate: f64,
    pub niche: String,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReferent {
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub followers: i64,
    #[serde(default)]
    pub avg_views: i64,
    #[serde(default)]
    pub engagement_rate: f64,
    pub niche: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferentPatch {
    pub url: Option<String>,
    pub username: Option<String>,
    pub followers: Option<i64>,
    pub avg_views: Option<i64>,
    pub engagement_rate: Option<f64>,
    pub niche: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all referents, most recently added first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_referents(pool: &PgPool) -> Result<Vec<ReferentRow>, DbError> {
    let sql = format!("SELECT {REFERENT_COLUMNS} FROM referents ORDER BY added_at DESC");
    let rows = sqlx::query_as::<_, ReferentRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Returns a single referent by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_referent(pool: &PgPool, id: Uuid) -> Result<Option<ReferentRow>, DbError> {
    let sql = format!("SELECT {REFERENT_COLUMNS} FROM referents WHERE id = $1");
    let row = sqlx::query_as::<_, ReferentRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Returns referents whose niche contains `niche` (case-insensitive), best
/// engagement first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_referents_by_niche(
    pool: &PgPool,
    niche: &str,
) -> Result<Vec<ReferentRow>, DbError> {
    let sql = format!(
        "SELECT {REFERENT_COLUMNS} FROM referents \
         WHERE niche ILIKE $1 \
         ORDER BY engagement_rate DESC"
    );
    let rows = sqlx::query_as::<_, ReferentRow>(&sql)
        .bind(contains_pattern(niche))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Builds an `ILIKE` pattern matching `needle` anywhere, with `%`, `_` and
/// `\` in the needle taken literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Inserts a referent and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_referent(pool: &PgPool, input: &NewReferent) -> Result<ReferentRow, DbError> {
    let sql = format!(
        "INSERT INTO referents (url, username, followers, avg_views, engagement_rate, niche, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {REFERENT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ReferentRow>(&sql)
        .bind(&input.url)
        .bind(&input.username)
        .bind(input.followers)
        .bind(input.avg_views)
        .bind(input.engagement_rate)
        .bind(&input.niche)
        .bind(&input.notes)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Applies a partial update and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no referent has this id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_referent(
    pool: &PgPool,
    id: Uuid,
    patch: &ReferentPatch,
) -> Result<ReferentRow, DbError> {
    let notes_supplied = patch.notes.is_some();
    let notes_val = patch.notes.clone().flatten();

    let sql = format!(
        "UPDATE referents \
         SET url             = COALESCE($2, url), \
             username        = COALESCE($3, username), \
             followers       = COALESCE($4, followers), \
             avg_views       = COALESCE($5, avg_views), \
             engagement_rate = COALESCE($6, engagement_rate), \
             niche           = COALESCE($7, niche), \
             notes           = CASE WHEN $8::BOOL THEN $9 ELSE notes END, \
             updated_at      = NOW() \
         WHERE id = $1 \
         RETURNING {REFERENT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ReferentRow>(&sql)
        .bind(id)
        .bind(&patch.url)
        .bind(&patch.username)
        .bind(patch.followers)
        .bind(patch.avg_views)
        .bind(patch.engagement_rate)
        .bind(&patch.niche)
        .bind(notes_supplied)
        .bind(notes_val)
        .fetch_optional(pool)
        .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a referent.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no referent has this id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn delete_referent(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM referents WHERE id = $1")
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
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("fit"), "%fit%");
        assert_eq!(contains_pattern("100%_real"), "%100\\%\\_real%");
    }
}
