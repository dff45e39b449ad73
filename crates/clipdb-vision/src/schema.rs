//! Declared output fields per extraction task.

use serde_json::{Map, Value};

use crate::task::ExtractionTask;

/// JSON category a declared field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// String, number or boolean.
    Scalar,
    List,
    Object,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null)
            | (FieldKind::Scalar, Value::Bool(_) | Value::Number(_) | Value::String(_))
            | (FieldKind::List, Value::Array(_))
            | (FieldKind::Object, Value::Object(_)) => true,
            _ => false,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldKind::Scalar => "scalar",
            FieldKind::List => "list",
            FieldKind::Object => "object",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn scalar(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Scalar,
    }
}

const fn list(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::List,
    }
}

const fn object(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Object,
    }
}

const SEARCH: &[FieldSpec] = &[list("search_queries")];
const DEMOGRAPHICS: &[FieldSpec] = &[list("age_ranges")];
const LOCATIONS: &[FieldSpec] = &[list("top_locations")];
const VIEWER_ACTIVE_TIMES: &[FieldSpec] = &[list("most_active_times_viewers")];
const FOLLOWER_ACTIVE_TIMES: &[FieldSpec] = &[list("most_active_times_followers")];
const RELATED_CREATORS: &[FieldSpec] = &[list("creators_also_watched")];

const PROFILE_OVERVIEW: &[FieldSpec] = &[
    scalar("profile_views"),
    scalar("profile_views_change"),
    object("traffic_source"),
    list("search_queries"),
];

const VIEWER_STATS: &[FieldSpec] = &[
    scalar("total_viewers"),
    scalar("total_viewers_change"),
    scalar("new_viewers"),
    scalar("new_viewers_change"),
    object("most_active_times"),
    object("gender"),
    list("age_ranges"),
    list("locations"),
    list("creators_also_watched"),
];

const FOLLOWER_STATS: &[FieldSpec] = &[
    scalar("total_followers"),
    scalar("total_followers_change"),
    scalar("net_followers"),
    scalar("net_followers_change"),
    object("gender"),
    object("most_active_times"),
    list("age_ranges"),
];

const VIDEO_CONTENT: &[FieldSpec] = &[
    scalar("title"),
    scalar("script"),
    scalar("short_description"),
    scalar("estimated_duration"),
    list("main_topics"),
    scalar("tone"),
    list("visual_elements"),
];

/// A declared field held a value of the wrong JSON category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMismatch {
    pub field: &'static str,
    pub expected: FieldKind,
}

impl std::fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "field '{}' is not a {}",
            self.field,
            self.expected.describe()
        )
    }
}

/// The ordered list of fields a task's output may contain.
#[derive(Debug, Clone, Copy)]
pub struct TaskSchema {
    task: ExtractionTask,
    fields: &'static [FieldSpec],
}

impl TaskSchema {
    #[must_use]
    pub fn for_task(task: ExtractionTask) -> Self {
        let fields = match task {
            ExtractionTask::Search => SEARCH,
            ExtractionTask::Demographics => DEMOGRAPHICS,
            ExtractionTask::Locations => LOCATIONS,
            ExtractionTask::ViewerActiveTimes => VIEWER_ACTIVE_TIMES,
            ExtractionTask::FollowerActiveTimes => FOLLOWER_ACTIVE_TIMES,
            ExtractionTask::RelatedCreators => RELATED_CREATORS,
            ExtractionTask::ProfileOverview => PROFILE_OVERVIEW,
            ExtractionTask::ViewerStats => VIEWER_STATS,
            ExtractionTask::FollowerStats => FOLLOWER_STATS,
            ExtractionTask::VideoContent => VIDEO_CONTENT,
        };
        Self { task, fields }
    }

    #[must_use]
    pub fn task(&self) -> ExtractionTask {
        self.task
    }

    #[must_use]
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    /// Keep only declared fields, checking each against its declared kind.
    ///
    /// Undeclared keys are dropped. A declared key with `null` is kept so the
    /// caller can tell "seen but empty" from "not reported". A declared key
    /// whose value has the wrong JSON category is dropped with a warning, so
    /// the rest of the payload survives.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaMismatch`] for the first offending field when every
    /// declared field present had the wrong category.
    pub fn conform(&self, mut object: Map<String, Value>) -> Result<Map<String, Value>, SchemaMismatch> {
        let mut kept = Map::new();
        let mut first_mismatch = None;
        for spec in self.fields {
            let Some(value) = object.remove(spec.name) else {
                continue;
            };
            if !spec.kind.accepts(&value) {
                tracing::warn!(
                    task = %self.task,
                    field = spec.name,
                    expected = spec.kind.describe(),
                    "dropping field with wrong JSON category"
                );
                if first_mismatch.is_none() {
                    first_mismatch = Some(SchemaMismatch {
                        field: spec.name,
                        expected: spec.kind,
                    });
                }
                continue;
            }
            kept.insert(spec.name.to_string(), value);
        }
        if !object.is_empty() {
            let dropped: Vec<&str> = object.keys().map(String::as_str).collect();
            tracing::debug!(task = %self.task, ?dropped, "dropping undeclared fields");
        }
        match first_mismatch {
            Some(mismatch) if kept.is_empty() => Err(mismatch),
            _ => Ok(kept),
        }
    }
}
