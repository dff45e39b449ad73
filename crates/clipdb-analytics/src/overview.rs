use clipdb_core::PublicationWithLatest;
use serde::Serialize;
use uuid::Uuid;

use crate::round::{round_rate, round_score};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPublication {
    pub id: Uuid,
    pub title: String,
    pub engagement_rate: f64,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_publications: usize,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_shares: i64,
    pub avg_engagement_rate: f64,
    pub avg_viral_score: f64,
    pub avg_watch_time: f64,
    pub best_publication: Option<BestPublication>,
}

/// Account-wide totals and averages over each publication's current snapshot.
///
/// Publications without a snapshot count as zeros. The best publication is
/// the one with the strictly greatest engagement rate; on ties the earlier
/// one is kept.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn overview(publications: &[PublicationWithLatest]) -> Overview {
    let mut total_views = 0;
    let mut total_likes = 0;
    let mut total_comments = 0;
    let mut total_shares = 0;
    let mut engagement_sum = 0.0;
    let mut viral_sum = 0.0;
    let mut watch_sum = 0.0;
    let mut best: Option<(&PublicationWithLatest, f64, i64)> = None;

    for item in publications {
        let current = item.current();
        total_views += current.views;
        total_likes += current.likes;
        total_comments += current.comments;
        total_shares += current.shares;
        engagement_sum += current.engagement_rate;
        viral_sum += current.viral_score;
        watch_sum += current.average_watch_time;

        match best {
            Some((_, best_rate, _)) if current.engagement_rate <= best_rate => {}
            _ => best = Some((item, current.engagement_rate, current.views)),
        }
    }

    let count = publications.len();
    let average = |sum: f64| if count == 0 { 0.0 } else { sum / count as f64 };

    Overview {
        total_publications: count,
        total_views,
        total_likes,
        total_comments,
        total_shares,
        avg_engagement_rate: round_rate(average(engagement_sum)),
        avg_viral_score: round_score(average(viral_sum)),
        avg_watch_time: round_score(average(watch_sum)),
        best_publication: best.map(|(item, engagement_rate, views)| BestPublication {
            id: item.publication.id,
            title: item.publication.title.clone(),
            engagement_rate,
            views,
        }),
    }
}
