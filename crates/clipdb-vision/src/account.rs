//! Mapping merged screenshot data onto an account-metrics record.

use chrono::{DateTime, Utc};
use clipdb_core::NewAccountMetrics;
use serde_json::Value;

use crate::merge::CombinedResult;
use crate::normalize::{count_from_value, percent_from_value};
use crate::task::ExtractionTask;

/// Which analytics page a batch of screenshots shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSubject {
    Profile,
    Viewers,
    Followers,
}

impl AccountSubject {
    #[must_use]
    pub fn task(self) -> ExtractionTask {
        match self {
            AccountSubject::Profile => ExtractionTask::ProfileOverview,
            AccountSubject::Viewers => ExtractionTask::ViewerStats,
            AccountSubject::Followers => ExtractionTask::FollowerStats,
        }
    }

    /// Fields whose absence from every image means the batch told us nothing.
    #[must_use]
    pub fn expected_fields(self) -> &'static [&'static str] {
        match self {
            AccountSubject::Profile => &["profile_views", "traffic_source", "search_queries"],
            AccountSubject::Viewers => &[
                "total_viewers",
                "new_viewers",
                "gender",
                "age_ranges",
                "locations",
                "most_active_times",
                "creators_also_watched",
            ],
            AccountSubject::Followers => &[
                "total_followers",
                "net_followers",
                "gender",
                "age_ranges",
                "most_active_times",
            ],
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccountSubject::Profile => "profile",
            AccountSubject::Viewers => "viewers",
            AccountSubject::Followers => "followers",
        }
    }
}

impl std::fmt::Display for AccountSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountSubject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(AccountSubject::Profile),
            "viewers" | "viewer" => Ok(AccountSubject::Viewers),
            "followers" | "follower" => Ok(AccountSubject::Followers),
            other => Err(format!("unknown account subject: {other}")),
        }
    }
}

fn nested<'a>(combined: &'a CombinedResult, object: &str, key: &str) -> Option<&'a Value> {
    combined.get(object).and_then(|o| o.get(key))
}

fn list(combined: &CombinedResult, name: &str) -> Option<Value> {
    combined.get(name).filter(|v| v.is_array()).cloned()
}

fn single_as_list(combined: &CombinedResult, name: &str) -> Option<Value> {
    combined
        .get(name)
        .filter(|v| v.is_object())
        .map(|v| Value::Array(vec![v.clone()]))
}

/// Build the record to persist for `subject` from its merged screenshots.
///
/// Counts accept plain numbers or strings like `"3.4K"`; changes and
/// percentages accept numbers or strings like `"+12%"`.
#[must_use]
pub fn account_metrics_from(
    subject: AccountSubject,
    combined: &CombinedResult,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> NewAccountMetrics {
    let count = |name: &str| combined.get(name).and_then(count_from_value);
    let percent = |name: &str| combined.get(name).and_then(percent_from_value);
    let nested_percent =
        |object: &str, key: &str| nested(combined, object, key).and_then(percent_from_value);

    let mut metrics = NewAccountMetrics {
        period_start: Some(period_start),
        period_end: Some(period_end),
        ..NewAccountMetrics::default()
    };

    match subject {
        AccountSubject::Profile => {
            metrics.profile_views = count("profile_views");
            metrics.profile_views_change = percent("profile_views_change");
            metrics.for_you_traffic_percent = nested_percent("traffic_source", "for_you");
            metrics.personal_profile_percent = nested_percent("traffic_source", "personal_profile");
            metrics.search_traffic_percent = nested_percent("traffic_source", "search");
            metrics.following_traffic_percent = nested_percent("traffic_source", "following");
            metrics.sound_traffic_percent = nested_percent("traffic_source", "sound");
            metrics.search_queries = list(combined, "search_queries");
        }
        AccountSubject::Viewers => {
            metrics.total_viewers = count("total_viewers");
            metrics.total_viewers_change = percent("total_viewers_change");
            metrics.new_viewers = count("new_viewers");
            metrics.new_viewers_change = percent("new_viewers_change");
            metrics.male_gender_percent = nested_percent("gender", "male");
            metrics.female_gender_percent = nested_percent("gender", "female");
            metrics.other_gender_percent = nested_percent("gender", "other");
            metrics.age_ranges = list(combined, "age_ranges");
            metrics.top_locations = list(combined, "locations");
            metrics.most_active_times_viewers = single_as_list(combined, "most_active_times");
            metrics.creators_also_watched = list(combined, "creators_also_watched");
        }
        AccountSubject::Followers => {
            metrics.total_followers = count("total_followers");
            metrics.total_followers_change = percent("total_followers_change");
            metrics.net_followers = count("net_followers");
            metrics.net_followers_change = percent("net_followers_change");
            metrics.male_gender_percent = nested_percent("gender", "male");
            metrics.female_gender_percent = nested_percent("gender", "female");
            metrics.other_gender_percent = nested_percent("gender", "other");
            metrics.age_ranges = list(combined, "age_ranges");
            metrics.most_active_times_followers = single_as_list(combined, "most_active_times");
        }
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::result::ExtractionResult;
    use crate::schema::TaskSchema;
    use chrono::TimeZone;
    use serde_json::json;

    fn combined(subject: AccountSubject, value: Value) -> CombinedResult {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        merge(
            &TaskSchema::for_task(subject.task()),
            &[ExtractionResult::Success(map)],
        )
    }

    fn period() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 28, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn profile_maps_traffic_sources() {
        let subject = AccountSubject::Profile;
        let c = combined(
            subject,
            json!({
                "profile_views": "1,204",
                "profile_views_change": "+12.5%",
                "traffic_source": {"for_you": "80%", "search": "5.5%", "sound": null},
                "search_queries": [{"query": "pasta", "percentage": "10%"}]
            }),
        );
        let (start, end) = period();
        let m = account_metrics_from(subject, &c, start, end);
        assert_eq!(m.profile_views, Some(1204));
        assert_eq!(m.profile_views_change, Some(12.5));
        assert_eq!(m.for_you_traffic_percent, Some(80.0));
        assert_eq!(m.search_traffic_percent, Some(5.5));
        assert_eq!(m.sound_traffic_percent, None);
        assert_eq!(
            m.search_queries,
            Some(json!([{"query": "pasta", "percentage": "10%"}]))
        );
        assert_eq!(m.period_start, Some(start));
        assert!(m.total_viewers.is_none());
    }

    #[test]
    fn viewers_map_locations_and_wrap_active_times() {
        let subject = AccountSubject::Viewers;
        let c = combined(
            subject,
            json!({
                "total_viewers": 15000,
                "new_viewers": "3.4K",
                "gender": {"male": "38%", "female": "62%"},
                "locations": [{"location": "Mexico", "percentage": "55%"}],
                "most_active_times": {"day": "Friday", "time_range": "6pm-9pm"}
            }),
        );
        let (start, end) = period();
        let m = account_metrics_from(subject, &c, start, end);
        assert_eq!(m.total_viewers, Some(15000));
        assert_eq!(m.new_viewers, Some(3400));
        assert_eq!(m.male_gender_percent, Some(38.0));
        assert_eq!(m.female_gender_percent, Some(62.0));
        assert_eq!(
            m.top_locations,
            Some(json!([{"location": "Mexico", "percentage": "55%"}]))
        );
        assert_eq!(
            m.most_active_times_viewers,
            Some(json!([{"day": "Friday", "time_range": "6pm-9pm"}]))
        );
        assert!(m.most_active_times_followers.is_none());
    }

    #[test]
    fn followers_map_counts_and_changes() {
        let subject = AccountSubject::Followers;
        let c = combined(
            subject,
            json!({
                "total_followers": 5400,
                "total_followers_change": "-1.2%",
                "net_followers": 120,
                "most_active_times": {"day": "Sunday", "time": "8pm"}
            }),
        );
        let (start, end) = period();
        let m = account_metrics_from(subject, &c, start, end);
        assert_eq!(m.total_followers, Some(5400));
        assert_eq!(m.total_followers_change, Some(-1.2));
        assert_eq!(m.net_followers, Some(120));
        assert_eq!(
            m.most_active_times_followers,
            Some(json!([{"day": "Sunday", "time": "8pm"}]))
        );
    }

    #[test]
    fn subject_parsing_accepts_singular() {
        assert_eq!("viewer".parse::<AccountSubject>(), Ok(AccountSubject::Viewers));
        assert_eq!("followers".parse::<AccountSubject>(), Ok(AccountSubject::Followers));
        assert!("audience".parse::<AccountSubject>().is_err());
    }
}
