use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::json;

use super::*;
use crate::provider::{RemoteFile, UploadMetadata};

/// Replays canned responses in order; image-only.
struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, VisionError>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String, VisionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl VisionProvider for ScriptedProvider {
    async fn generate(&self, _prompt: &str, _media: &MediaPart) -> Result<String, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(VisionError::MissingField("scripted reply")))
    }

    async fn upload_file(
        &self,
        _path: &Path,
        _metadata: &UploadMetadata,
    ) -> Result<RemoteFile, VisionError> {
        unreachable!("image-only provider")
    }

    async fn get_file(&self, _name: &str) -> Result<RemoteFile, VisionError> {
        unreachable!("image-only provider")
    }

    async fn delete_file(&self, _name: &str) -> Result<(), VisionError> {
        unreachable!("image-only provider")
    }
}

fn extractor(replies: Vec<Result<String, VisionError>>) -> VisionExtractor<ScriptedProvider> {
    VisionExtractor::new(ScriptedProvider::new(replies)).expect("extractor")
}

#[test]
fn interpret_accepts_object_after_prose() {
    let result = interpret(
        ExtractionTask::FollowerStats,
        "Here you go:\n{\"total_followers\": 5400, \"net_followers\": 120}",
    );
    let payload = result.payload().expect("success");
    assert_eq!(payload["total_followers"], json!(5400));
    assert_eq!(payload["net_followers"], json!(120));
}

#[test]
fn interpret_without_braces_keeps_raw_text() {
    let result = interpret(ExtractionTask::Search, "No analytics visible.");
    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.kind, FailureKind::NoJson);
    assert_eq!(failure.raw_response.as_deref(), Some("No analytics visible."));
}

#[test]
fn interpret_malformed_region() {
    let result = interpret(ExtractionTask::Search, "{\"search_queries\": [}");
    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.kind, FailureKind::MalformedJson);
    assert!(failure.reason.starts_with("parse error"));
    assert!(failure.raw_response.is_some());
}

#[test]
fn interpret_schema_mismatch() {
    let result = interpret(ExtractionTask::Locations, "{\"top_locations\": \"Mexico 50%\"}");
    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.kind, FailureKind::SchemaMismatch);
}

#[test]
fn interpret_keeps_well_typed_fields_beside_a_mismatch() {
    let result = interpret(
        ExtractionTask::FollowerStats,
        r#"{"total_followers": 5400, "age_ranges": "18-24: 40%"}"#,
    );
    let payload = result.payload().expect("success");
    assert_eq!(payload["total_followers"], json!(5400));
    assert!(!payload.contains_key("age_ranges"));
}

#[test]
fn interpret_keeps_values_unmodified() {
    let result = interpret(
        ExtractionTask::ProfileOverview,
        r#"{"profile_views": "1,204", "profile_views_change": "+12.5%"}"#,
    );
    let payload = result.payload().expect("success");
    assert_eq!(payload["profile_views"], json!("1,204"));
    assert_eq!(payload["profile_views_change"], json!("+12.5%"));
}

#[test]
fn sniffs_common_image_types() {
    assert_eq!(sniff_image_mime(b"\x89PNG\r\n\x1a\nrest"), "image/png");
    assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
    assert_eq!(sniff_image_mime(b"GIF89a..."), "image/gif");
    assert_eq!(sniff_image_mime(b"\xff\xd8\xff\xe0"), "image/jpeg");
    assert_eq!(sniff_image_mime(b""), "image/jpeg");
}

#[tokio::test]
async fn provider_error_becomes_provider_failure() {
    let extractor = extractor(vec![Err(VisionError::Provider {
        status: 503,
        body: "overloaded".to_string(),
    })]);
    let result = extractor
        .extract_image(ExtractionTask::Search, b"\xff\xd8".to_vec())
        .await;
    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.kind, FailureKind::Provider);
    assert!(failure.reason.contains("503"));
    assert!(failure.raw_response.is_none());
}

#[tokio::test]
async fn analyze_images_runs_each_image_and_merges() {
    let extractor = extractor(vec![
        Ok(r#"{"total_viewers": 900, "age_ranges": [{"range": "18-24", "percentage": "40%"}]}"#
            .to_string()),
        Ok("sorry, unreadable".to_string()),
        Ok(r#"{"total_viewers": 1, "age_ranges": [{"range": "25-34", "percentage": "30%"}]}"#
            .to_string()),
    ]);

    let analysis = extractor
        .analyze_images(
            ExtractionTask::ViewerStats,
            vec![vec![1], vec![2], vec![3]],
        )
        .await;

    assert_eq!(extractor.provider().calls.load(Ordering::SeqCst), 3);
    assert_eq!(analysis.individual_results.len(), 3);
    assert_eq!(analysis.success_count(), 2);
    assert_eq!(
        analysis.combined_result.get("total_viewers"),
        Some(&json!(900))
    );
    assert_eq!(
        analysis.combined_result.get("age_ranges"),
        Some(&json!([
            {"range": "18-24", "percentage": "40%"},
            {"range": "25-34", "percentage": "30%"}
        ]))
    );

    let rendered = serde_json::to_value(&analysis).unwrap();
    assert_eq!(rendered["combined_result"]["success"], json!(true));
    assert_eq!(rendered["individual_results"][1]["error_kind"], json!("no_json"));
}

#[tokio::test]
async fn analyze_images_with_no_images_is_empty_success() {
    let extractor = extractor(vec![]);
    let analysis = extractor
        .analyze_images(ExtractionTask::ProfileOverview, vec![])
        .await;
    assert!(analysis.individual_results.is_empty());
    assert!(analysis.combined_result.is_empty());
    assert_eq!(extractor.provider().calls.load(Ordering::SeqCst), 0);
}
