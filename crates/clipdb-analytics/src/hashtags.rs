use std::collections::HashMap;

use clipdb_core::PublicationWithLatest;
use serde::Serialize;

use crate::round::round_rate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashtagStats {
    pub hashtag: String,
    pub uses: u32,
    pub total_views: i64,
    /// Likes + comments + shares.
    pub total_engagement: i64,
    pub avg_engagement_rate: f64,
}

struct Bucket {
    hashtag: String,
    uses: u32,
    views: i64,
    engagement: i64,
}

impl Bucket {
    #[allow(clippy::cast_precision_loss)]
    fn rate(&self) -> f64 {
        if self.views == 0 {
            0.0
        } else {
            self.engagement as f64 / self.views as f64 * 100.0
        }
    }
}

/// Per-hashtag use count, reach and engagement, best rate first.
///
/// Ties keep the order in which hashtags were first seen.
#[must_use]
pub fn hashtag_analysis(publications: &[PublicationWithLatest]) -> Vec<HashtagStats> {
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in publications {
        let current = item.current();
        let engagement = current.likes + current.comments + current.shares;

        for tag in &item.publication.hashtags {
            let slot = *index.entry(tag.as_str()).or_insert_with(|| {
                buckets.push(Bucket {
                    hashtag: tag.clone(),
                    uses: 0,
                    views: 0,
                    engagement: 0,
                });
                buckets.len() - 1
            });
            let bucket = &mut buckets[slot];
            bucket.uses += 1;
            bucket.views += current.views;
            bucket.engagement += engagement;
        }
    }

    buckets.sort_by(|a, b| b.rate().total_cmp(&a.rate()));
    buckets
        .into_iter()
        .map(|bucket| HashtagStats {
            avg_engagement_rate: round_rate(bucket.rate()),
            hashtag: bucket.hashtag,
            uses: bucket.uses,
            total_views: bucket.views,
            total_engagement: bucket.engagement,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{publication, snapshot};

    #[test]
    fn dance_example() {
        let a = publication("A", "Danza", &["dance", "fyp"], Some(snapshot(1000, 100, 0, 0, 10.0)));
        let b = publication("B", "Danza", &["dance"], Some(snapshot(500, 0, 50, 0, 10.0)));
        let stats = hashtag_analysis(&[a, b]);

        let dance = stats.iter().find(|s| s.hashtag == "dance").expect("dance");
        assert_eq!(dance.uses, 2);
        assert_eq!(dance.total_views, 1500);
        assert_eq!(dance.total_engagement, 150);
        assert!((dance.avg_engagement_rate - 10.0).abs() < 1e-9);

        let fyp = stats.iter().find(|s| s.hashtag == "fyp").expect("fyp");
        assert_eq!(fyp.uses, 1);
    }

    #[test]
    fn sorted_by_rate_with_first_seen_tie_break() {
        let a = publication("A", "x", &["low", "tie1"], Some(snapshot(1000, 10, 0, 0, 1.0)));
        let b = publication("B", "x", &["high"], Some(snapshot(100, 50, 0, 0, 50.0)));
        let c = publication("C", "x", &["tie2"], Some(snapshot(1000, 10, 0, 0, 1.0)));
        let order: Vec<String> = hashtag_analysis(&[a, b, c])
            .into_iter()
            .map(|s| s.hashtag)
            .collect();
        assert_eq!(order, vec!["high", "low", "tie1", "tie2"]);
    }

    #[test]
    fn zero_views_rate_is_zero() {
        let a = publication("A", "x", &["new"], None);
        let stats = hashtag_analysis(&[a]);
        assert_eq!(stats.len(), 1);
        assert!(stats[0].avg_engagement_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn saves_are_not_engagement_here() {
        let mut snap = snapshot(100, 0, 0, 0, 0.0);
        snap.saves = 40;
        let stats = hashtag_analysis(&[publication("A", "x", &["t"], Some(snap))]);
        assert_eq!(stats[0].total_engagement, 0);
    }
}
