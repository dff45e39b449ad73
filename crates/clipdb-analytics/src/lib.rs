//! In-memory aggregation of publication metrics into analytics views.
//!
//! Every function here is pure: callers load the data, these functions fold
//! it. Rates are accumulated unrounded and rounded only in the returned
//! structs (two decimals for rates, one for scores and durations).

mod content_types;
mod daily;
mod hashtags;
mod overview;
mod round;

pub use content_types::{content_type_analysis, ContentTypeStats};
pub use daily::{performance_by_day, DailyPerformance};
pub use hashtags::{hashtag_analysis, HashtagStats};
pub use overview::{overview, BestPublication, Overview};
pub use round::{round_rate, round_score};
