use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published short-form video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Free-form content category, e.g. `"Tutorial"` or `"Danza"`.
    pub content_type: String,
    pub duration_secs: i32,
    pub hashtags: Vec<String>,
    pub sound_name: String,
    pub sound_trending: bool,
    pub published_at: DateTime<Utc>,
    pub video_url: String,
    pub thumbnail_url: String,
    /// Caller-supplied link to the script document, if any.
    pub script_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One timestamped engagement observation of a publication.
///
/// `Default` is the zero snapshot used for publications with no recorded
/// metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
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

/// A publication paired with its most recent snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationWithLatest {
    pub publication: Publication,
    pub latest: Option<MetricSnapshot>,
}

impl PublicationWithLatest {
    /// The latest snapshot, or the zero snapshot if none was recorded.
    #[must_use]
    pub fn current(&self) -> MetricSnapshot {
        self.latest.clone().unwrap_or_default()
    }
}

/// Engagement rate as a percentage of views, rounded to two decimals.
///
/// Returns `0.0` when `views` is zero or negative.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_rate(views: i64, likes: i64, comments: i64, shares: i64, saves: i64) -> f64 {
    if views <= 0 {
        return 0.0;
    }
    let interactions = likes + comments + shares + saves;
    let rate = interactions as f64 / views as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}
