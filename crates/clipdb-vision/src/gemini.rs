//! Client for the Generative Language REST API (Gemini).
//!
//! Covers the three calls the pipeline needs: `generateContent` with inline
//! image data or a file reference, the resumable file upload protocol, and
//! file lookup / deletion.

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::VisionError;
use crate::provider::{FileState, MediaPart, RemoteFile, UploadMetadata, VisionProvider};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";
/// The key travels in a header so it never appears in request URLs.
const API_KEY_HEADER: &str = "x-goog-api-key";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

impl From<FileResource> for RemoteFile {
    fn from(resource: FileResource) -> Self {
        let state = resource
            .state
            .as_deref()
            .map_or(FileState::Processing, FileState::from_api);
        RemoteFile {
            name: resource.name,
            uri: resource.uri,
            mime_type: resource.mime_type,
            state,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Gemini-backed [`VisionProvider`].
///
/// Use [`GeminiClient::new`] for production or [`GeminiClient::with_base_url`]
/// to point at a mock server in tests.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, VisionError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("clipdb/0.1 (analytics-extraction)")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/{API_VERSION}/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/{API_VERSION}/files", self.base_url)
    }

    fn file_url(&self, name: &str) -> String {
        format!(
            "{}/{API_VERSION}/{}",
            self.base_url,
            name.trim_start_matches('/')
        )
    }

    /// Converts a non-2xx response into [`VisionError::Provider`] with the
    /// response body preserved.
    async fn check_status(response: Response) -> Result<Response, VisionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(VisionError::Provider {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, VisionError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| VisionError::Decode {
            context: context.to_string(),
            source: e,
        })
    }
}

fn media_json(media: &MediaPart) -> Value {
    match media {
        MediaPart::InlineImage { mime_type, data } => json!({
            "inline_data": {
                "mime_type": mime_type,
                "data": BASE64.encode(data),
            }
        }),
        MediaPart::FileRef { uri, mime_type } => json!({
            "file_data": {
                "file_uri": uri,
                "mime_type": mime_type,
            }
        }),
    }
}

fn generate_body(prompt: &str, media: &MediaPart) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [media_json(media), { "text": prompt }],
        }]
    })
}

fn response_text(response: GenerateResponse) -> Result<String, VisionError> {
    let texts: Vec<String> = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if texts.is_empty() {
        return Err(VisionError::MissingField("candidates[0].content.parts[].text"));
    }
    Ok(texts.join(""))
}

impl VisionProvider for GeminiClient {
    async fn generate(&self, prompt: &str, media: &MediaPart) -> Result<String, VisionError> {
        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&generate_body(prompt, media))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let parsed: GenerateResponse = Self::decode(response, "generateContent").await?;
        response_text(parsed)
    }

    async fn upload_file(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
    ) -> Result<RemoteFile, VisionError> {
        let bytes = tokio::fs::read(path).await?;

        let start = self
            .client
            .post(self.upload_url())
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", &metadata.mime_type)
            .json(&json!({ "file": { "display_name": metadata.display_name } }))
            .send()
            .await?;
        let start = Self::check_status(start).await?;

        let session_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
            .ok_or(VisionError::MissingField("x-goog-upload-url header"))?;

        let finalize = self
            .client
            .post(session_url)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("X-Goog-Upload-Offset", "0")
            .header(reqwest::header::CONTENT_TYPE, &metadata.mime_type)
            .body(bytes)
            .send()
            .await?;
        let finalize = Self::check_status(finalize).await?;

        let uploaded: UploadResponse = Self::decode(finalize, "files.upload").await?;
        tracing::debug!(name = %uploaded.file.name, "uploaded file to provider");
        Ok(uploaded.file.into())
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, VisionError> {
        let response = self
            .client
            .get(self.file_url(name))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let resource: FileResource = Self::decode(response, "files.get").await?;
        Ok(resource.into())
    }

    async fn delete_file(&self, name: &str) -> Result<(), VisionError> {
        let response = self
            .client
            .delete(self.file_url(name))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::with_base_url("test-key", "gemini-1.5-pro", 30, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn urls_strip_trailing_slash() {
        let client = test_client("https://example.test/");
        assert_eq!(
            client.generate_url(),
            "https://example.test/v1beta/models/gemini-1.5-pro:generateContent"
        );
        assert_eq!(client.upload_url(), "https://example.test/upload/v1beta/files");
        assert_eq!(
            client.file_url("files/abc"),
            "https://example.test/v1beta/files/abc"
        );
    }

    #[test]
    fn inline_image_is_base64_encoded() {
        let body = generate_body(
            "describe",
            &MediaPart::InlineImage {
                mime_type: "image/png".to_string(),
                data: b"hello".to_vec(),
            },
        );
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inline_data"]["data"], "aGVsbG8=");
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["text"], "describe");
    }

    #[test]
    fn file_reference_uses_file_data() {
        let body = generate_body(
            "describe",
            &MediaPart::FileRef {
                uri: "https://files.example/abc".to_string(),
                mime_type: "video/mp4".to_string(),
            },
        );
        let part = &body["contents"][0]["parts"][0]["file_data"];
        assert_eq!(part["file_uri"], "https://files.example/abc");
        assert_eq!(part["mime_type"], "video/mp4");
    }

    #[test]
    fn response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}]
        }))
        .unwrap();
        assert_eq!(response_text(parsed).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn response_without_candidates_is_missing_field() {
        let parsed: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            response_text(parsed),
            Err(VisionError::MissingField(_))
        ));
    }

    #[test]
    fn missing_state_is_treated_as_processing() {
        let resource: FileResource =
            serde_json::from_value(json!({"name": "files/x", "uri": "u", "mimeType": "video/mp4"}))
                .unwrap();
        assert_eq!(RemoteFile::from(resource).state, FileState::Processing);
    }
}
