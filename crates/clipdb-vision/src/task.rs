use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named analysis goal. Determines both the prompt and the output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionTask {
    Search,
    Demographics,
    Locations,
    #[serde(alias = "viewers_times")]
    ViewerActiveTimes,
    #[serde(alias = "followers_times")]
    FollowerActiveTimes,
    #[serde(alias = "creators")]
    RelatedCreators,
    #[serde(alias = "profile")]
    ProfileOverview,
    #[serde(alias = "viewer")]
    ViewerStats,
    #[serde(alias = "follower")]
    FollowerStats,
    #[serde(alias = "video")]
    VideoContent,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown extraction task: {0}")]
pub struct UnknownTask(pub String);

impl ExtractionTask {
    pub const ALL: [ExtractionTask; 10] = [
        ExtractionTask::Search,
        ExtractionTask::Demographics,
        ExtractionTask::Locations,
        ExtractionTask::ViewerActiveTimes,
        ExtractionTask::FollowerActiveTimes,
        ExtractionTask::RelatedCreators,
        ExtractionTask::ProfileOverview,
        ExtractionTask::ViewerStats,
        ExtractionTask::FollowerStats,
        ExtractionTask::VideoContent,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionTask::Search => "search",
            ExtractionTask::Demographics => "demographics",
            ExtractionTask::Locations => "locations",
            ExtractionTask::ViewerActiveTimes => "viewer-active-times",
            ExtractionTask::FollowerActiveTimes => "follower-active-times",
            ExtractionTask::RelatedCreators => "related-creators",
            ExtractionTask::ProfileOverview => "profile-overview",
            ExtractionTask::ViewerStats => "viewer-stats",
            ExtractionTask::FollowerStats => "follower-stats",
            ExtractionTask::VideoContent => "video-content",
        }
    }

    fn legacy_alias(self) -> Option<&'static str> {
        match self {
            ExtractionTask::ViewerActiveTimes => Some("viewers_times"),
            ExtractionTask::FollowerActiveTimes => Some("followers_times"),
            ExtractionTask::RelatedCreators => Some("creators"),
            ExtractionTask::ProfileOverview => Some("profile"),
            ExtractionTask::ViewerStats => Some("viewer"),
            ExtractionTask::FollowerStats => Some("follower"),
            ExtractionTask::VideoContent => Some("video"),
            _ => None,
        }
    }

    /// Tasks whose media is a single screenshot.
    #[must_use]
    pub fn is_image_task(self) -> bool {
        !matches!(self, ExtractionTask::VideoContent)
    }
}

impl std::fmt::Display for ExtractionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExtractionTask {
    type Err = UnknownTask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ExtractionTask::ALL
            .into_iter()
            .find(|task| task.as_str() == needle || task.legacy_alias() == Some(needle))
            .ok_or_else(|| UnknownTask(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip_through_from_str() {
        for task in ExtractionTask::ALL {
            assert_eq!(task.as_str().parse::<ExtractionTask>(), Ok(task));
        }
    }

    #[test]
    fn legacy_aliases_are_accepted() {
        assert_eq!(
            "viewers_times".parse::<ExtractionTask>(),
            Ok(ExtractionTask::ViewerActiveTimes)
        );
        assert_eq!(
            "creators".parse::<ExtractionTask>(),
            Ok(ExtractionTask::RelatedCreators)
        );
        assert_eq!(
            "follower".parse::<ExtractionTask>(),
            Ok(ExtractionTask::FollowerStats)
        );
    }

    #[test]
    fn serde_uses_kebab_case_and_aliases() {
        let task: ExtractionTask = serde_json::from_str("\"viewer-active-times\"").unwrap();
        assert_eq!(task, ExtractionTask::ViewerActiveTimes);
        let task: ExtractionTask = serde_json::from_str("\"profile\"").unwrap();
        assert_eq!(task, ExtractionTask::ProfileOverview);
        assert_eq!(
            serde_json::to_string(&ExtractionTask::RelatedCreators).unwrap(),
            "\"related-creators\""
        );
    }

    #[test]
    fn unknown_task_is_rejected() {
        assert_eq!(
            "heatmap".parse::<ExtractionTask>(),
            Err(UnknownTask("heatmap".to_string()))
        );
    }
}
