//! `account-metrics` subcommand handlers.
//!
//! `load` records one reporting period from numbers typed on the command line
//! plus optional screenshot URLs, one per breakdown. Each URL is extracted with
//! the matching task; a failed extraction is reported and that breakdown left
//! empty.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use clipdb_core::{AppConfig, NewAccountMetrics};
use clipdb_vision::ExtractionTask;
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::analyze::build_extractor;

#[derive(Debug, Subcommand)]
pub enum AccountMetricsCommands {
    /// Delete every stored account-metrics record
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Record account metrics for one period
    Load(LoadArgs),
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// First day of the period (YYYY-MM-DD)
    #[arg(long)]
    pub period_start: NaiveDate,
    /// Last day of the period (YYYY-MM-DD)
    #[arg(long)]
    pub period_end: NaiveDate,

    #[arg(long)]
    pub video_views: Option<i64>,
    #[arg(long)]
    pub profile_views: Option<i64>,
    #[arg(long)]
    pub total_viewers: Option<i64>,
    #[arg(long)]
    pub new_viewers: Option<i64>,
    #[arg(long)]
    pub total_followers: Option<i64>,
    #[arg(long)]
    pub net_followers: Option<i64>,

    #[arg(long)]
    pub for_you_traffic_percent: Option<f64>,
    #[arg(long)]
    pub personal_profile_percent: Option<f64>,
    #[arg(long)]
    pub search_traffic_percent: Option<f64>,
    #[arg(long)]
    pub following_traffic_percent: Option<f64>,
    #[arg(long)]
    pub sound_traffic_percent: Option<f64>,

    #[arg(long)]
    pub male_gender_percent: Option<f64>,
    #[arg(long)]
    pub female_gender_percent: Option<f64>,
    #[arg(long)]
    pub other_gender_percent: Option<f64>,

    /// Screenshot URL of top search queries
    #[arg(long)]
    pub search_image: Option<String>,
    /// Screenshot URL of the age breakdown
    #[arg(long)]
    pub demographics_image: Option<String>,
    /// Screenshot URL of top locations
    #[arg(long)]
    pub locations_image: Option<String>,
    /// Screenshot URL of viewer activity times
    #[arg(long)]
    pub viewers_times_image: Option<String>,
    /// Screenshot URL of follower activity times
    #[arg(long)]
    pub followers_times_image: Option<String>,
    /// Screenshot URL of related creators
    #[arg(long)]
    pub creators_image: Option<String>,
}

impl LoadArgs {
    fn image_urls(&self) -> Vec<(ExtractionTask, &str)> {
        [
            (ExtractionTask::Search, &self.search_image),
            (ExtractionTask::Demographics, &self.demographics_image),
            (ExtractionTask::Locations, &self.locations_image),
            (ExtractionTask::ViewerActiveTimes, &self.viewers_times_image),
            (
                ExtractionTask::FollowerActiveTimes,
                &self.followers_times_image,
            ),
            (ExtractionTask::RelatedCreators, &self.creators_image),
        ]
        .into_iter()
        .filter_map(|(task, url)| url.as_deref().map(|u| (task, u)))
        .collect()
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// The record implied by the command-line numbers alone.
fn base_metrics(args: &LoadArgs) -> NewAccountMetrics {
    NewAccountMetrics {
        video_views: args.video_views,
        profile_views: args.profile_views,
        total_viewers: args.total_viewers,
        new_viewers: args.new_viewers,
        total_followers: args.total_followers,
        net_followers: args.net_followers,
        for_you_traffic_percent: args.for_you_traffic_percent,
        personal_profile_percent: args.personal_profile_percent,
        search_traffic_percent: args.search_traffic_percent,
        following_traffic_percent: args.following_traffic_percent,
        sound_traffic_percent: args.sound_traffic_percent,
        male_gender_percent: args.male_gender_percent,
        female_gender_percent: args.female_gender_percent,
        other_gender_percent: args.other_gender_percent,
        period_start: Some(day_start(args.period_start)),
        period_end: Some(day_start(args.period_end)),
        ..NewAccountMetrics::default()
    }
}

/// Copies the list a breakdown task produced into its column.
fn apply_breakdown(metrics: &mut NewAccountMetrics, task: ExtractionTask, payload: &Map<String, Value>) {
    let (slot, key) = match task {
        ExtractionTask::Search => (&mut metrics.search_queries, "search_queries"),
        ExtractionTask::Demographics => (&mut metrics.age_ranges, "age_ranges"),
        ExtractionTask::Locations => (&mut metrics.top_locations, "top_locations"),
        ExtractionTask::ViewerActiveTimes => (
            &mut metrics.most_active_times_viewers,
            "most_active_times_viewers",
        ),
        ExtractionTask::FollowerActiveTimes => (
            &mut metrics.most_active_times_followers,
            "most_active_times_followers",
        ),
        ExtractionTask::RelatedCreators => {
            (&mut metrics.creators_also_watched, "creators_also_watched")
        }
        _ => return,
    };
    *slot = payload.get(key).filter(|v| !v.is_null()).cloned();
}

fn list_len(metrics: &NewAccountMetrics, task: ExtractionTask) -> usize {
    let value = match task {
        ExtractionTask::Search => &metrics.search_queries,
        ExtractionTask::Demographics => &metrics.age_ranges,
        ExtractionTask::Locations => &metrics.top_locations,
        ExtractionTask::ViewerActiveTimes => &metrics.most_active_times_viewers,
        ExtractionTask::FollowerActiveTimes => &metrics.most_active_times_followers,
        ExtractionTask::RelatedCreators => &metrics.creators_also_watched,
        _ => return 0,
    };
    value.as_ref().and_then(Value::as_array).map_or(0, Vec::len)
}

pub(crate) async fn run_clear(pool: &PgPool, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("refusing to delete account metrics without --yes");
    }
    let deleted = clipdb_db::delete_all_account_metrics(pool).await?;
    tracing::info!(deleted, "account metrics cleared");
    println!("deleted {deleted} account-metrics record(s)");
    Ok(())
}

pub(crate) async fn run_load(
    pool: &PgPool,
    config: &AppConfig,
    args: &LoadArgs,
) -> anyhow::Result<()> {
    if args.period_start > args.period_end {
        anyhow::bail!("--period-start must not be after --period-end");
    }

    let mut metrics = base_metrics(args);
    let images = args.image_urls();

    if !images.is_empty() {
        let extractor = build_extractor(config)?;
        for (task, url) in &images {
            let result = extractor.extract_from_url(*task, url).await;
            match (result.payload(), result.as_failure()) {
                (Some(payload), _) => {
                    apply_breakdown(&mut metrics, *task, payload);
                    println!("{task}: {} item(s) extracted", list_len(&metrics, *task));
                }
                (None, Some(failure)) => {
                    tracing::warn!(%task, %url, kind = %failure.kind, reason = %failure.reason, "extraction failed");
                    println!("{task}: extraction failed ({})", failure.reason);
                }
                (None, None) => {}
            }
        }
    }

    let row = clipdb_db::create_account_metrics(pool, &metrics).await?;
    println!(
        "saved account metrics {} for {} to {} ({} of 6 screenshots analyzed)",
        row.id,
        args.period_start,
        args.period_end,
        images.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(extra: &[&str]) -> LoadArgs {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            load: LoadArgs,
        }

        let mut argv = vec![
            "load",
            "--period-start",
            "2025-03-01",
            "--period-end",
            "2025-03-07",
        ];
        argv.extend_from_slice(extra);
        Wrapper::try_parse_from(argv).expect("valid args").load
    }

    #[test]
    fn base_metrics_carries_numbers_and_period() {
        let load = args(&["--profile-views", "3400", "--male-gender-percent", "41.5"]);
        let metrics = base_metrics(&load);
        assert_eq!(metrics.profile_views, Some(3400));
        assert_eq!(metrics.male_gender_percent, Some(41.5));
        assert!(metrics.video_views.is_none());
        assert!(metrics.has_valid_period());
        assert_eq!(
            metrics.period_end.map(|d| d.to_rfc3339()),
            Some("2025-03-07T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn image_urls_keep_task_order() {
        let load = args(&[
            "--creators-image",
            "https://img/creators.png",
            "--search-image",
            "https://img/search.png",
        ]);
        let tasks: Vec<ExtractionTask> = load.image_urls().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            tasks,
            vec![ExtractionTask::Search, ExtractionTask::RelatedCreators]
        );
    }

    #[test]
    fn breakdown_fills_matching_column() {
        let mut metrics = NewAccountMetrics::default();
        let payload = json!({"top_locations": [{"country": "MX", "percentage": 61}]});
        let Value::Object(map) = payload else {
            panic!("object expected");
        };
        apply_breakdown(&mut metrics, ExtractionTask::Locations, &map);
        assert_eq!(list_len(&metrics, ExtractionTask::Locations), 1);
        assert!(metrics.search_queries.is_none());
    }

    #[test]
    fn breakdown_ignores_null_lists() {
        let mut metrics = NewAccountMetrics::default();
        let Value::Object(map) = json!({"search_queries": null}) else {
            panic!("object expected");
        };
        apply_breakdown(&mut metrics, ExtractionTask::Search, &map);
        assert!(metrics.search_queries.is_none());
    }
}
