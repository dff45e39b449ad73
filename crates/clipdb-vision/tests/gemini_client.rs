//! Integration tests for `GeminiClient` using wiremock HTTP mocks.

use clipdb_vision::{
    ExtractionTask, FailureKind, FileState, GeminiClient, MediaPart, UploadMetadata,
    VisionError, VisionExtractor, VisionProvider,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> GeminiClient {
    GeminiClient::with_base_url("test-key", "gemini-1.5-pro", 30, base_url)
        .expect("client construction should not fail")
}

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn generate_sends_inline_image_and_returns_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"inline_data": {"mime_type": "image/png", "data": "AQID"}}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("{\"a\": 1}")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let text = client
        .generate(
            "extract",
            &MediaPart::InlineImage {
                mime_type: "image/png".to_string(),
                data: vec![1, 2, 3],
            },
        )
        .await
        .expect("should return text");

    assert_eq!(text, "{\"a\": 1}");
}

#[tokio::test]
async fn generate_surfaces_error_status_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .generate(
            "extract",
            &MediaPart::FileRef {
                uri: "https://files.example/x".to_string(),
                mime_type: "video/mp4".to_string(),
            },
        )
        .await
        .expect_err("should fail");

    match err {
        VisionError::Provider { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("expected Provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn extractor_parses_model_text_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(
            "Here is what I found:\n```json\n{\"total_followers\": 5400, \"gender\": {\"male\": \"40%\"}}\n```",
        )))
        .mount(&server)
        .await;

    let extractor = VisionExtractor::new(test_client(&server.uri())).expect("extractor");
    let result = extractor
        .extract_image(ExtractionTask::FollowerStats, vec![0xff, 0xd8, 0xff])
        .await;

    let payload = result.payload().expect("success");
    assert_eq!(payload["total_followers"], json!(5400));
    assert_eq!(payload["gender"]["male"], json!("40%"));
}

#[tokio::test]
async fn extract_from_url_downloads_then_extracts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bucket/search.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG\r\n\x1a\nxxxx".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"inline_data": {"mime_type": "image/png"}}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(
            "{\"search_queries\": [{\"term\": \"pasta\", \"percentage\": 12}]}",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = VisionExtractor::new(test_client(&server.uri())).expect("extractor");
    let result = extractor
        .extract_from_url(
            ExtractionTask::Search,
            &format!("{}/bucket/search.png", server.uri()),
        )
        .await;

    assert_eq!(
        result.payload().expect("success")["search_queries"],
        json!([{"term": "pasta", "percentage": 12}])
    );
}

#[tokio::test]
async fn extract_from_url_download_failure_is_provider_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bucket/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let extractor = VisionExtractor::new(test_client(&server.uri())).expect("extractor");
    let result = extractor
        .extract_from_url(
            ExtractionTask::Search,
            &format!("{}/bucket/missing.png", server.uri()),
        )
        .await;

    assert_eq!(
        result.as_failure().map(|f| f.kind),
        Some(FailureKind::Provider)
    );
}

#[tokio::test]
async fn unreachable_provider_failure_does_not_expose_api_key() {
    let client = GeminiClient::with_base_url("SECRET-KEY-123", "m", 5, "http://127.0.0.1:1")
        .expect("client construction should not fail");
    let extractor = VisionExtractor::new(client).expect("extractor");

    let result = extractor
        .extract_image(ExtractionTask::ViewerStats, vec![0x89, b'P', b'N', b'G'])
        .await;

    assert_eq!(
        result.as_failure().map(|f| f.kind),
        Some(FailureKind::Provider)
    );
    let rendered = serde_json::to_string(&result).unwrap();
    assert!(!rendered.contains("SECRET-KEY-123"), "{rendered}");
    assert!(!rendered.contains("key="), "{rendered}");
}

#[tokio::test]
async fn upload_file_runs_resumable_protocol() {
    let server = MockServer::start().await;
    let session_url = format!("{}/upload-session/abc", server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .and(header("x-goog-api-key", "test-key"))
        .and(header("x-goog-upload-protocol", "resumable"))
        .and(header("x-goog-upload-command", "start"))
        .and(header("x-goog-upload-header-content-length", "5"))
        .and(header("x-goog-upload-header-content-type", "video/mp4"))
        .and(body_partial_json(json!({"file": {"display_name": "clip.mp4"}})))
        .respond_with(ResponseTemplate::new(200).insert_header("x-goog-upload-url", session_url.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": {
                "name": "files/abc",
                "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc",
                "mimeType": "video/mp4",
                "state": "PROCESSING"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = std::env::temp_dir().join(format!("clipdb-upload-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let file_path = dir.join("clip.mp4");
    std::fs::write(&file_path, b"video").unwrap();

    let client = test_client(&server.uri());
    let remote = client
        .upload_file(
            &file_path,
            &UploadMetadata {
                mime_type: "video/mp4".to_string(),
                display_name: "clip.mp4".to_string(),
            },
        )
        .await
        .expect("upload should succeed");

    assert_eq!(remote.name, "files/abc");
    assert_eq!(remote.mime_type, "video/mp4");
    assert_eq!(remote.state, FileState::Processing);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn upload_without_session_header_is_missing_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = std::env::temp_dir().join(format!("clipdb-upload-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let file_path = dir.join("clip.mp4");
    std::fs::write(&file_path, b"video").unwrap();

    let client = test_client(&server.uri());
    let err = client
        .upload_file(
            &file_path,
            &UploadMetadata {
                mime_type: "video/mp4".to_string(),
                display_name: "clip.mp4".to_string(),
            },
        )
        .await
        .expect_err("should fail");

    assert!(matches!(err, VisionError::MissingField(_)));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn get_and_delete_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "files/abc",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc",
            "mimeType": "video/mp4",
            "state": "ACTIVE"
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let file = client.get_file("files/abc").await.expect("get should succeed");
    assert_eq!(file.state, FileState::Active);

    client
        .delete_file("files/abc")
        .await
        .expect("delete should succeed");
}
