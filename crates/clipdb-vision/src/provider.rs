use std::future::Future;
use std::path::Path;

use crate::error::VisionError;

/// Media attached to a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPart {
    /// Raw image bytes, sent base64-encoded inside the request.
    InlineImage { mime_type: String, data: Vec<u8> },
    /// A file previously uploaded to the provider's file store.
    FileRef { uri: String, mime_type: String },
}

/// Processing state the provider reports for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Processing,
    Active,
    Failed,
    Unknown(String),
}

impl FileState {
    #[must_use]
    pub fn from_api(raw: &str) -> Self {
        match raw {
            "PROCESSING" => FileState::Processing,
            "ACTIVE" => FileState::Active,
            "FAILED" => FileState::Failed,
            other => FileState::Unknown(other.to_string()),
        }
    }
}

/// Handle to a file held by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Provider resource name, e.g. `files/abc123`.
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub state: FileState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub mime_type: String,
    pub display_name: String,
}

/// A multimodal model that can read images and uploaded videos.
pub trait VisionProvider: Send + Sync {
    /// Run one generation request and return the concatenated response text.
    fn generate(
        &self,
        prompt: &str,
        media: &MediaPart,
    ) -> impl Future<Output = Result<String, VisionError>> + Send;

    /// Upload a local file to the provider's file store.
    fn upload_file(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
    ) -> impl Future<Output = Result<RemoteFile, VisionError>> + Send;

    /// Fetch the current state of an uploaded file.
    fn get_file(&self, name: &str) -> impl Future<Output = Result<RemoteFile, VisionError>> + Send;

    fn delete_file(&self, name: &str) -> impl Future<Output = Result<(), VisionError>> + Send;
}
