use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a planned piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Planned,
    InProgress,
    Ready,
    Published,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid content status: {0}")]
pub struct InvalidStatus(pub String);

impl ContentStatus {
    pub const ALL: [ContentStatus; 4] = [
        ContentStatus::Planned,
        ContentStatus::InProgress,
        ContentStatus::Ready,
        ContentStatus::Published,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentStatus::Planned => "planned",
            ContentStatus::InProgress => "in_progress",
            ContentStatus::Ready => "ready",
            ContentStatus::Published => "published",
        }
    }

    /// Statuses counted as upcoming work.
    #[must_use]
    pub fn is_pending(self) -> bool {
        !matches!(self, ContentStatus::Published)
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}
