use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Counts of rows inserted by [`seed_demo_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub publications: usize,
    pub metrics: usize,
    pub planned_content: usize,
    pub referents: usize,
}

struct DemoPublication {
    title: &'static str,
    description: &'static str,
    content_type: &'static str,
    duration_secs: i32,
    hashtags: &'static [&'static str],
    sound_name: &'static str,
    published: (i32, u32, u32),
    video_url: &'static str,
    thumbnail_url: &'static str,
    // views, likes, comments, shares, engagement_rate, watch_time, viral_score, sound_interactions
    metrics: (i64, i64, i64, i64, f64, f64, f64, i64),
}

const DEMO_PUBLICATIONS: &[DemoPublication] = &[
    DemoPublication {
        title: "Tutorial: how to make videos go viral",
        description: "Tips and tricks for viral short-form content",
        content_type: "Tutorial",
        duration_secs: 60,
        hashtags: &["tutorial", "viral", "tips"],
        sound_name: "Original Sound - CreatorName",
        published: (2024, 1, 15),
        video_url: "https://www.tiktok.com/@user/video/123",
        thumbnail_url: "https://example.com/thumb1.jpg",
        metrics: (125_000, 15_600, 890, 2_340, 15.2, 45.5, 87.0, 560),
    },
    DemoPublication {
        title: "Trending dance of the moment",
        description: "The new choreography everyone is copying",
        content_type: "Danza",
        duration_secs: 30,
        hashtags: &["dance", "trending", "viral", "fyp"],
        sound_name: "Trending Dance Beat 2024",
        published: (2024, 1, 20),
        video_url: "https://www.tiktok.com/@user/video/124",
        thumbnail_url: "",
        metrics: (89_000, 12_300, 670, 1_890, 16.8, 28.3, 92.0, 780),
    },
];

/// Insert a small demo dataset: two publications with one snapshot each, one
/// planned item and one referent.
///
/// All inserts run inside a single transaction; if any fails the whole batch
/// is rolled back. Running it twice inserts the data twice.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_demo_data(pool: &PgPool) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for demo in DEMO_PUBLICATIONS {
        let (y, m, d) = demo.published;
        let published_at = Utc
            .with_ymd_and_hms(y, m, d, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let hashtags: Vec<String> = demo.hashtags.iter().map(ToString::to_string).collect();

        let publication_id: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO publications \
               (title, description, content_type, duration_secs, hashtags, sound_name, \
                sound_trending, published_at, video_url, thumbnail_url) \
             VALUES ($1, $2, $3, $4, $5, $6, true, $7, $8, $9) \
             RETURNING id",
        )
        .bind(demo.title)
        .bind(demo.description)
        .bind(demo.content_type)
        .bind(demo.duration_secs)
        .bind(&hashtags)
        .bind(demo.sound_name)
        .bind(published_at)
        .bind(demo.video_url)
        .bind(demo.thumbnail_url)
        .fetch_one(&mut *tx)
        .await?;
        summary.publications += 1;

        let (views, likes, comments, shares, rate, watch, viral, sound) = demo.metrics;
        sqlx::query(
            "INSERT INTO publication_metrics \
               (publication_id, views, likes, comments, shares, engagement_rate, \
                average_watch_time, viral_score, sound_interactions) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(publication_id)
        .bind(views)
        .bind(likes)
        .bind(comments)
        .bind(shares)
        .bind(rate)
        .bind(watch)
        .bind(viral)
        .bind(sound)
        .execute(&mut *tx)
        .await?;
        summary.metrics += 1;
    }

    sqlx::query(
        "INSERT INTO planned_content \
           (title, description, content_type, hashtags, sound_idea, scheduled_date, status, \
            estimated_views, notes) \
         VALUES ($1, $2, $3, $4, $5, NOW() + INTERVAL '3 days', 'planned', $6, $7)",
    )
    .bind("Productivity video")
    .bind("Tips for working from home")
    .bind("Educativo")
    .bind(vec!["productivity", "tips", "workspace", "motivation"])
    .bind("Motivational music")
    .bind(50_000_i64)
    .bind("Record in the new office, use the phone stand")
    .execute(&mut *tx)
    .await?;
    summary.planned_content += 1;

    sqlx::query(
        "INSERT INTO referents (url, username, followers, avg_views, engagement_rate, niche, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind("https://www.tiktok.com/@productivity_guru")
    .bind("productivity_guru")
    .bind(2_500_000_i64)
    .bind(150_000_i64)
    .bind(12.5_f64)
    .bind("Productividad")
    .bind("Great source of educational content ideas")
    .execute(&mut *tx)
    .await?;
    summary.referents += 1;

    tx.commit().await?;
    Ok(summary)
}
