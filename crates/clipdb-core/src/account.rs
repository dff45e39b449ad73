use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account-level analytics for one reporting period, ready to persist.
///
/// Every measurement is optional: a snapshot built from screenshots only
/// carries what the screenshots showed. Percent fields hold plain numbers
/// (`12.5` for 12.5%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAccountMetrics {
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

    pub search_queries: Option<serde_json::Value>,
    pub age_ranges: Option<serde_json::Value>,
    pub top_locations: Option<serde_json::Value>,
    pub most_active_times_viewers: Option<serde_json::Value>,
    pub most_active_times_followers: Option<serde_json::Value>,
    pub creators_also_watched: Option<serde_json::Value>,

    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
}

impl NewAccountMetrics {
    /// Returns `true` when both period bounds are set and ordered.
    #[must_use]
    pub fn has_valid_period(&self) -> bool {
        matches!((self.period_start, self.period_end), (Some(start), Some(end)) if start <= end)
    }
}
