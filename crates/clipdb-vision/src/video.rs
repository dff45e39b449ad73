//! Upload → poll → analyze → cleanup lifecycle for a single video.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tokio::time::Instant;

use crate::extract::VisionExtractor;
use crate::provider::{FileState, MediaPart, RemoteFile, UploadMetadata, VisionProvider};
use crate::result::{ExtractionResult, FailureKind};
use crate::task::ExtractionTask;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 300;

const MIME_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("wmv", "video/x-ms-wmv"),
    ("flv", "video/x-flv"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("3gp", "video/3gpp"),
];

/// Bounds on waiting for the provider to finish processing an upload.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_wait: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollConfig {
    #[must_use]
    pub fn from_app_config(config: &clipdb_core::AppConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.video_poll_interval_ms),
            max_wait: Duration::from_secs(config.video_max_wait_secs),
            max_attempts: config.video_max_poll_attempts,
        }
    }
}

/// MIME type for a video file name, by extension. Defaults to `video/mp4`.
#[must_use]
pub fn mime_for_file_name(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map_or("video/mp4", |(_, mime)| mime)
}

/// Analyzes one video end to end.
///
/// The remote file and the scratch copy are removed on every exit path,
/// including a panic during analysis (which is re-raised after cleanup).
/// Dropping the returned future mid-flight skips cleanup.
pub struct VideoAnalyzer<'a, P> {
    extractor: &'a VisionExtractor<P>,
    poll: PollConfig,
    scratch_dir: PathBuf,
}

impl<'a, P: VisionProvider> VideoAnalyzer<'a, P> {
    #[must_use]
    pub fn new(extractor: &'a VisionExtractor<P>, poll: PollConfig, scratch_dir: PathBuf) -> Self {
        Self {
            extractor,
            poll,
            scratch_dir,
        }
    }

    pub async fn analyze(&self, video: &[u8], file_name: &str) -> ExtractionResult {
        tracing::info!(file_name, bytes = video.len(), "starting video analysis");

        let scratch = match self.stage(video, file_name).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(file_name, error = %e, "failed to stage video");
                return ExtractionResult::failure(
                    FailureKind::ScratchIo,
                    format!("could not write scratch file: {e}"),
                );
            }
        };

        let mut handle: Option<RemoteFile> = None;
        let outcome = AssertUnwindSafe(self.run(&scratch, file_name, &mut handle))
            .catch_unwind()
            .await;

        self.cleanup(handle.as_ref(), &scratch).await;

        match outcome {
            Ok(result) => {
                tracing::info!(file_name, success = result.is_success(), "video analysis finished");
                result
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn stage(&self, video: &[u8], file_name: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        let base = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("video");
        let path = self
            .scratch_dir
            .join(format!("{}-{base}", uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&path, video).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }
        Ok(path)
    }

    async fn run(
        &self,
        scratch: &Path,
        file_name: &str,
        handle: &mut Option<RemoteFile>,
    ) -> ExtractionResult {
        let provider = self.extractor.provider();
        let metadata = UploadMetadata {
            mime_type: mime_for_file_name(file_name).to_string(),
            display_name: file_name.to_string(),
        };

        let uploaded = match provider.upload_file(scratch, &metadata).await {
            Ok(file) => file,
            Err(e) => {
                return ExtractionResult::failure(
                    FailureKind::Provider,
                    format!("video upload failed: {e}"),
                );
            }
        };
        tracing::info!(name = %uploaded.name, uri = %uploaded.uri, "video uploaded");
        *handle = Some(uploaded.clone());

        let ready = match self.wait_until_ready(&uploaded).await {
            Ok(file) => file,
            Err(failure) => return failure,
        };

        let mime_type = if ready.mime_type.is_empty() {
            metadata.mime_type
        } else {
            ready.mime_type
        };
        let media = MediaPart::FileRef {
            uri: ready.uri,
            mime_type,
        };

        let mut result = self
            .extractor
            .extract(ExtractionTask::VideoContent, &media)
            .await;
        if let ExtractionResult::Success(payload) = &mut result {
            payload.insert(
                "source_file".to_string(),
                Value::String(file_name.to_string()),
            );
        }
        result
    }

    async fn wait_until_ready(&self, uploaded: &RemoteFile) -> Result<RemoteFile, ExtractionResult> {
        let provider = self.extractor.provider();
        let started = Instant::now();
        let mut attempts: u32 = 0;

        let mut file = provider.get_file(&uploaded.name).await.map_err(|e| {
            ExtractionResult::failure(FailureKind::Provider, format!("file lookup failed: {e}"))
        })?;

        loop {
            match &file.state {
                FileState::Active => return Ok(file),
                FileState::Failed => {
                    return Err(ExtractionResult::failure(
                        FailureKind::ProcessingFailed,
                        "processing failed",
                    ));
                }
                FileState::Unknown(state) => {
                    tracing::warn!(name = %file.name, state = %state, "unexpected file state; proceeding");
                    return Ok(file);
                }
                FileState::Processing => {}
            }

            if attempts >= self.poll.max_attempts
                || started.elapsed() + self.poll.interval > self.poll.max_wait
            {
                return Err(ExtractionResult::failure(
                    FailureKind::Timeout,
                    format!(
                        "video still processing after {attempts} polls ({}s)",
                        started.elapsed().as_secs()
                    ),
                ));
            }

            tokio::time::sleep(self.poll.interval).await;
            attempts += 1;
            tracing::debug!(name = %uploaded.name, attempts, "polling file state");
            file = provider.get_file(&uploaded.name).await.map_err(|e| {
                ExtractionResult::failure(FailureKind::Provider, format!("file lookup failed: {e}"))
            })?;
        }
    }

    async fn cleanup(&self, handle: Option<&RemoteFile>, scratch: &Path) {
        if let Some(file) = handle {
            if let Err(e) = self.extractor.provider().delete_file(&file.name).await {
                tracing::warn!(name = %file.name, error = %e, "failed to delete uploaded file");
            }
        }
        if let Err(e) = tokio::fs::remove_file(scratch).await {
            tracing::warn!(path = %scratch.display(), error = %e, "failed to remove scratch file");
        }
    }
}

#[cfg(test)]
#[path = "video_test.rs"]
mod tests;
