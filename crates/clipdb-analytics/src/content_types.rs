use std::collections::HashMap;

use clipdb_core::PublicationWithLatest;
use serde::Serialize;

use crate::round::{round_rate, round_score};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentTypeStats {
    pub content_type: String,
    pub count: u32,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_shares: i64,
    pub avg_engagement_rate: f64,
    pub avg_viral_score: f64,
}

#[derive(Default)]
struct Bucket {
    count: u32,
    views: i64,
    likes: i64,
    comments: i64,
    shares: i64,
    engagement_sum: f64,
    viral_sum: f64,
}

/// Per content type: counts, sums and averaged engagement / viral score.
///
/// Sorted by average engagement rate, best first; ties keep first-seen order.
#[must_use]
pub fn content_type_analysis(publications: &[PublicationWithLatest]) -> Vec<ContentTypeStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut buckets: HashMap<&str, Bucket> = HashMap::new();

    for item in publications {
        let key = item.publication.content_type.as_str();
        let current = item.current();
        let bucket = buckets.entry(key).or_insert_with(|| {
            order.push(key);
            Bucket::default()
        });
        bucket.count += 1;
        bucket.views += current.views;
        bucket.likes += current.likes;
        bucket.comments += current.comments;
        bucket.shares += current.shares;
        bucket.engagement_sum += current.engagement_rate;
        bucket.viral_sum += current.viral_score;
    }

    let mut rows: Vec<(f64, ContentTypeStats)> = order
        .into_iter()
        .filter_map(|key| buckets.remove(key).map(|b| (key, b)))
        .map(|(key, b)| {
            let count = f64::from(b.count);
            let avg_engagement = b.engagement_sum / count;
            let stats = ContentTypeStats {
                content_type: key.to_string(),
                count: b.count,
                total_views: b.views,
                total_likes: b.likes,
                total_comments: b.comments,
                total_shares: b.shares,
                avg_engagement_rate: round_rate(avg_engagement),
                avg_viral_score: round_score(b.viral_sum / count),
            };
            (avg_engagement, stats)
        })
        .collect();

    rows.sort_by(|a, b| b.0.total_cmp(&a.0));
    rows.into_iter().map(|(_, stats)| stats).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{publication, snapshot};

    #[test]
    fn averages_are_sum_over_count() {
        let mut s1 = snapshot(1000, 100, 10, 5, 12.0);
        s1.viral_score = 80.0;
        let mut s2 = snapshot(500, 50, 5, 1, 18.0);
        s2.viral_score = 61.0;
        let rows = content_type_analysis(&[
            publication("A", "Tutorial", &[], Some(s1)),
            publication("B", "Tutorial", &[], Some(s2)),
            publication("C", "Danza", &[], Some(snapshot(10, 1, 0, 0, 20.0))),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].content_type, "Danza");
        let tutorial = &rows[1];
        assert_eq!(tutorial.count, 2);
        assert_eq!(tutorial.total_views, 1500);
        assert_eq!(tutorial.total_likes, 150);
        assert_eq!(tutorial.total_comments, 15);
        assert_eq!(tutorial.total_shares, 6);
        assert!((tutorial.avg_engagement_rate - 15.0).abs() < 1e-9);
        assert!((tutorial.avg_viral_score - 70.5).abs() < 1e-9);
    }

    #[test]
    fn publication_without_snapshot_lowers_average() {
        let rows = content_type_analysis(&[
            publication("A", "Vlog", &[], Some(snapshot(100, 10, 0, 0, 10.0))),
            publication("B", "Vlog", &[], None),
        ]);
        assert!((rows[0].avg_engagement_rate - 5.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(content_type_analysis(&[]).is_empty());
    }
}
