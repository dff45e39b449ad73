//! Offline vision extraction: run a task against local files or a URL and
//! print the result. Nothing is written to the database.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use clipdb_core::AppConfig;
use clipdb_vision::{ExtractionTask, GeminiClient, PollConfig, VideoAnalyzer, VisionExtractor};

#[derive(Debug, Subcommand)]
pub enum AnalyzeCommands {
    /// Extract from one or more screenshots and merge the results
    Images {
        /// Extraction task (e.g. search, demographics, profile-overview)
        #[arg(long)]
        task: ExtractionTask,
        /// Image files, processed in the order given
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Download one image and extract from it
    Url {
        #[arg(long)]
        task: ExtractionTask,
        url: String,
    },
    /// Upload a video and extract its content description
    Video { file: PathBuf },
}

/// Builds an extractor from config, failing when no API key is set.
pub(crate) fn build_extractor(config: &AppConfig) -> anyhow::Result<VisionExtractor<GeminiClient>> {
    let api_key = config
        .gemini_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY is not set; cannot run vision analysis"))?;
    let client = GeminiClient::with_base_url(
        api_key,
        &config.gemini_model,
        config.vision_request_timeout_secs,
        &config.gemini_base_url,
    )
    .map_err(|e| anyhow::anyhow!("failed to build Gemini client: {e}"))?;
    VisionExtractor::new(client).map_err(|e| anyhow::anyhow!("failed to build extractor: {e}"))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn run(config: &AppConfig, command: AnalyzeCommands) -> anyhow::Result<()> {
    let extractor = build_extractor(config)?;

    match command {
        AnalyzeCommands::Images { task, files } => {
            let mut images = Vec::with_capacity(files.len());
            for path in &files {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                images.push(bytes);
            }
            let analysis = extractor.analyze_images(task, images).await;
            if analysis.success_count() == 0 {
                tracing::warn!(%task, files = files.len(), "no image produced a result");
            }
            print_json(&analysis)
        }
        AnalyzeCommands::Url { task, url } => {
            let result = extractor.extract_from_url(task, &url).await;
            print_json(&result)
        }
        AnalyzeCommands::Video { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload.mp4")
                .to_string();
            let analyzer = VideoAnalyzer::new(
                &extractor,
                PollConfig::from_app_config(config),
                config.scratch_dir.clone(),
            );
            let result = analyzer.analyze(&bytes, &file_name).await;
            print_json(&result)?;
            if let Some(failure) = result.as_failure() {
                anyhow::bail!("video analysis failed ({}): {}", failure.kind, failure.reason);
            }
            Ok(())
        }
    }
}
