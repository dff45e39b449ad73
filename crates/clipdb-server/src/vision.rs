use std::path::PathBuf;

use clipdb_core::AppConfig;
use clipdb_vision::{GeminiClient, PollConfig, VideoAnalyzer, VisionError, VisionExtractor};

/// Vision extraction wired to the configured provider.
pub struct VisionService {
    extractor: VisionExtractor<GeminiClient>,
    poll: PollConfig,
    scratch_dir: PathBuf,
}

impl VisionService {
    /// Returns `Ok(None)` when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if an HTTP client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, VisionError> {
        let Some(api_key) = config.gemini_api_key.as_deref() else {
            tracing::warn!("GEMINI_API_KEY not set; vision endpoints disabled");
            return Ok(None);
        };

        let client = GeminiClient::with_base_url(
            api_key,
            &config.gemini_model,
            config.vision_request_timeout_secs,
            &config.gemini_base_url,
        )?;
        tracing::info!(model = client.model(), "vision provider configured");

        Ok(Some(Self {
            extractor: VisionExtractor::new(client)?,
            poll: PollConfig::from_app_config(config),
            scratch_dir: config.scratch_dir.clone(),
        }))
    }

    pub fn extractor(&self) -> &VisionExtractor<GeminiClient> {
        &self.extractor
    }

    pub fn video_analyzer(&self) -> VideoAnalyzer<'_, GeminiClient> {
        VideoAnalyzer::new(&self.extractor, self.poll, self.scratch_dir.clone())
    }
}
