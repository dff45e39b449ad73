use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clipdb_core::MetricSnapshot;
use serde::Serialize;

use crate::round::round_rate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPerformance {
    pub date: NaiveDate,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub avg_engagement: f64,
    /// Number of snapshots recorded that day.
    pub publications: u32,
}

#[derive(Default)]
struct Bucket {
    views: i64,
    likes: i64,
    comments: i64,
    shares: i64,
    engagement_sum: f64,
    records: u32,
}

/// Daily totals for snapshots recorded in the last `window_days` before `now`.
///
/// Days are UTC calendar dates; output is oldest first.
#[must_use]
pub fn performance_by_day(
    records: &[MetricSnapshot],
    window_days: u32,
    now: DateTime<Utc>,
) -> Vec<DailyPerformance> {
    let since = now - Duration::days(i64::from(window_days));
    let mut days: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();

    for record in records.iter().filter(|r| r.recorded_at >= since) {
        let bucket = days.entry(record.recorded_at.date_naive()).or_default();
        bucket.views += record.views;
        bucket.likes += record.likes;
        bucket.comments += record.comments;
        bucket.shares += record.shares;
        bucket.engagement_sum += record.engagement_rate;
        bucket.records += 1;
    }

    days.into_iter()
        .map(|(date, b)| DailyPerformance {
            date,
            views: b.views,
            likes: b.likes,
            comments: b.comments,
            shares: b.shares,
            avg_engagement: round_rate(b.engagement_sum / f64::from(b.records)),
            publications: b.records,
        })
        .collect()
}
