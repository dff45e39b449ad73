//! Instruction text sent alongside the media for each task.
//!
//! Every prompt asks for exactly one JSON object and for `null` / `[]` in
//! place of values that are not visible, so the parser never has to guess
//! whether a key was omitted on purpose.

use crate::task::ExtractionTask;

const MISSING_DATA_RULE: &str = "If a value is not visible in this image, use null for single values and [] for lists. \
Reply with the JSON object only.";

const SEARCH: &str = r#"Extract the search queries from this TikTok Analytics screenshot.
Look for search terms and the percentage shown next to each one.

Respond with this JSON:
{
    "search_queries": [
        {"term": "search term", "percentage": number}
    ]
}"#;

const DEMOGRAPHICS: &str = r#"Extract the audience age ranges from this TikTok Analytics screenshot.
Look for ranges such as "18-24" or "25-34" and their percentages.

Respond with this JSON:
{
    "age_ranges": [
        {"range": "18-24", "percentage": number}
    ]
}"#;

const LOCATIONS: &str = r#"Extract the top audience locations from this TikTok Analytics screenshot.
Look for countries or cities and their percentages.

Respond with this JSON:
{
    "top_locations": [
        {"location": "name", "type": "country or city", "percentage": number}
    ]
}"#;

const VIEWER_ACTIVE_TIMES: &str = r#"Extract the most active times of viewers from this TikTok Analytics screenshot.
Look for specific hours and their activity percentages.

Respond with this JSON:
{
    "most_active_times_viewers": [
        {"hour": hour_of_day, "percentage": number}
    ]
}"#;

const FOLLOWER_ACTIVE_TIMES: &str = r#"Extract the most active times of followers from this TikTok Analytics screenshot.
Look for specific hours and their activity percentages.

Respond with this JSON:
{
    "most_active_times_followers": [
        {"hour": hour_of_day, "percentage": number}
    ]
}"#;

const RELATED_CREATORS: &str = r#"Extract the creators your viewers also watched from this TikTok Analytics screenshot.
Look for usernames and follower counts.

Respond with this JSON:
{
    "creators_also_watched": [
        {"username": "@user", "followers": number}
    ]
}"#;

const PROFILE_OVERVIEW: &str = r#"Extract from this TikTok Analytics screenshot:

1. Profile views (number, and percent change if visible)
2. Traffic source (percentages for For You, Personal profile, Search, Following, Sound)
3. Search queries (terms and percentages)

Respond with this JSON:
{
    "profile_views": number,
    "profile_views_change": "percent change or null",
    "traffic_source": {
        "for_you": "X%",
        "personal_profile": "X%",
        "search": "X%",
        "following": "X%",
        "sound": "X%"
    },
    "search_queries": [
        {"query": "term", "percentage": "X%"}
    ]
}"#;

const VIEWER_STATS: &str = r#"Extract the viewer data from this TikTok Analytics screenshot:

1. Total viewers (number and percent change)
2. New viewers (number and percent change)
3. Most active times (the specific time mentioned)
4. Gender (Male/Female/Other percentages if visible)
5. Age (age ranges and percentages if visible)
6. Locations (countries/cities and percentages if visible)
7. Creators your viewers also watched (names and followers if visible)

Respond with this JSON:
{
    "total_viewers": number,
    "total_viewers_change": "percent change",
    "new_viewers": number,
    "new_viewers_change": "percent change",
    "most_active_times": {
        "day": "specific day",
        "time_range": "range of hours",
        "full_description": "full text as shown"
    },
    "gender": {
        "male": "X%",
        "female": "X%",
        "other": "X%"
    },
    "age_ranges": [
        {"range": "18-24", "percentage": "X%"}
    ],
    "locations": [
        {"location": "country/city", "percentage": "X%"}
    ],
    "creators_also_watched": [
        {"name": "name", "followers": "follower count"}
    ]
}"#;

const FOLLOWER_STATS: &str = r#"Extract the follower data from this TikTok Analytics screenshot:

1. Total followers (number, and percent change if visible)
2. Net followers (number, and percent change if visible)
3. Gender (exact Male/Female/Other percentages)
4. Most active times (specific day and hour mentioned)
5. Age (specific age ranges and their exact percentages)

Respond with this JSON:
{
    "total_followers": number,
    "total_followers_change": "percent change or null",
    "net_followers": number,
    "net_followers_change": "percent change",
    "gender": {
        "male": "X%",
        "female": "X%",
        "other": "X%"
    },
    "most_active_times": {
        "day": "specific day",
        "time": "specific hour",
        "full_description": "full text as shown"
    },
    "age_ranges": [
        {"range": "exact range", "percentage": "exact percentage"}
    ]
}

Copy percentages exactly as they appear (e.g. "62%", "38%", "60.4%")."#;

const VIDEO_CONTENT: &str = r#"Analyze this video in detail and describe it as JSON:

1. Title: an engaging, descriptive title capturing the essence of the content (at most 60 characters)
2. Script: a detailed transcription of what is said and shown, including
   - main dialogue
   - important actions
   - relevant visual elements
   - significant music or sounds
3. Short description: a concise, engaging description for social media (at most 150 characters)

Respond with this JSON:
{
    "title": "Engaging video title",
    "script": "Detailed transcription of the content, actions and dialogue...",
    "short_description": "Short engaging description",
    "estimated_duration": "Approximate duration",
    "main_topics": ["topic1", "topic2", "topic3"],
    "tone": "descriptive/funny/serious/educational/etc",
    "visual_elements": ["element1", "element2"]
}

Be specific and detailed in the script, capturing both audio and important visual elements."#;

/// Full instruction text for `task`.
#[must_use]
pub fn prompt_for(task: ExtractionTask) -> String {
    let body = match task {
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
    if task.is_image_task() {
        format!("{body}\n\n{MISSING_DATA_RULE}")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TaskSchema;

    #[test]
    fn every_prompt_mentions_every_declared_field() {
        for task in ExtractionTask::ALL {
            let prompt = prompt_for(task);
            for field in TaskSchema::for_task(task).fields() {
                assert!(
                    prompt.contains(&format!("\"{}\"", field.name)),
                    "prompt for {task} does not mention {}",
                    field.name
                );
            }
        }
    }

    #[test]
    fn image_prompts_request_empty_collections() {
        for task in ExtractionTask::ALL.into_iter().filter(|t| t.is_image_task()) {
            assert!(prompt_for(task).contains("use null"), "{task}");
        }
    }
}
