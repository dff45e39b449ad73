//! Task-driven extraction: prompt + media in, typed result out.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::error::VisionError;
use crate::merge::{merge, CombinedResult};
use crate::parse::{parse_lenient, ParseError};
use crate::prompts::prompt_for;
use crate::provider::{MediaPart, VisionProvider};
use crate::result::{ExtractionResult, FailureKind};
use crate::schema::TaskSchema;
use crate::task::ExtractionTask;

const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Per-image results plus their merge.
#[derive(Debug, Clone, Serialize)]
pub struct ImageBatchAnalysis {
    pub individual_results: Vec<ExtractionResult>,
    pub combined_result: CombinedResult,
}

impl ImageBatchAnalysis {
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.individual_results
            .iter()
            .filter(|r| r.is_success())
            .count()
    }
}

/// Runs extraction tasks against a [`VisionProvider`].
///
/// Never returns `Err`: every failure is folded into an
/// [`ExtractionResult::Failure`] carrying a [`FailureKind`].
pub struct VisionExtractor<P> {
    provider: P,
    http: Client,
}

impl<P: VisionProvider> VisionExtractor<P> {
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the image download client cannot be
    /// constructed.
    pub fn new(provider: P) -> Result<Self, VisionError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("clipdb/0.1 (analytics-extraction)")
            .build()?;
        Ok(Self { provider, http })
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run `task` against one piece of media. Not retried.
    pub async fn extract(&self, task: ExtractionTask, media: &MediaPart) -> ExtractionResult {
        let prompt = prompt_for(task);
        tracing::debug!(%task, "requesting extraction");

        let text = match self.provider.generate(&prompt, media).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(%task, error = %e, "vision provider call failed");
                return ExtractionResult::failure(
                    FailureKind::Provider,
                    format!("error analyzing media: {e}"),
                );
            }
        };

        let result = interpret(task, &text);
        if let Some(failure) = result.as_failure() {
            tracing::warn!(%task, kind = %failure.kind, reason = %failure.reason, "extraction failed");
        }
        result
    }

    /// Extract from raw image bytes, sniffing the MIME type.
    pub async fn extract_image(&self, task: ExtractionTask, bytes: Vec<u8>) -> ExtractionResult {
        let media = MediaPart::InlineImage {
            mime_type: sniff_image_mime(&bytes).to_string(),
            data: bytes,
        };
        self.extract(task, &media).await
    }

    /// Download an image over HTTP, then extract from it.
    pub async fn extract_from_url(&self, task: ExtractionTask, url: &str) -> ExtractionResult {
        tracing::info!(%task, url, "downloading image for extraction");
        match self.download(url).await {
            Ok(bytes) => self.extract_image(task, bytes).await,
            Err(e) => {
                tracing::warn!(%task, url, error = %e, "image download failed");
                ExtractionResult::failure(
                    FailureKind::Provider,
                    format!("error downloading image: {e}"),
                )
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, VisionError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Extract from each image in order, then merge the successes.
    ///
    /// Images are processed one after another so the provider sees at most
    /// one request from this call at a time.
    pub async fn analyze_images(
        &self,
        task: ExtractionTask,
        images: Vec<Vec<u8>>,
    ) -> ImageBatchAnalysis {
        let total = images.len();
        tracing::info!(%task, images = total, "analyzing image batch");

        let mut individual_results = Vec::with_capacity(total);
        for bytes in images {
            individual_results.push(self.extract_image(task, bytes).await);
        }

        let combined_result = merge(&TaskSchema::for_task(task), &individual_results);
        let analysis = ImageBatchAnalysis {
            individual_results,
            combined_result,
        };
        tracing::info!(
            %task,
            images = total,
            succeeded = analysis.success_count(),
            fields = analysis.combined_result.fields().len(),
            "image batch analyzed"
        );
        analysis
    }
}

/// Turn raw model text into a result for `task`.
#[must_use]
pub fn interpret(task: ExtractionTask, text: &str) -> ExtractionResult {
    let object = match parse_lenient(text) {
        Ok(object) => object,
        Err(ParseError::NoJson) => {
            return ExtractionResult::failure_with_raw(
                FailureKind::NoJson,
                "no JSON found in response",
                text,
            );
        }
        Err(ParseError::Malformed(reason)) => {
            return ExtractionResult::failure_with_raw(
                FailureKind::MalformedJson,
                format!("parse error: {reason}"),
                text,
            );
        }
    };

    match TaskSchema::for_task(task).conform(object) {
        Ok(payload) => ExtractionResult::Success(payload),
        Err(mismatch) => ExtractionResult::failure_with_raw(
            FailureKind::SchemaMismatch,
            mismatch.to_string(),
            text,
        ),
    }
}

/// Best-effort image type from magic bytes. Defaults to `image/jpeg`.
#[must_use]
pub fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
