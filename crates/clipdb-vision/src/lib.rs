//! Vision-model extraction of analytics data from screenshots and videos.
//!
//! The pipeline is: a task picks a prompt ([`prompts`]) and a schema
//! ([`schema`]); a [`VisionProvider`] turns prompt + media into free text; the
//! lenient parser ([`parse`]) recovers the embedded JSON object; per-image
//! results are folded by [`merge`]. Videos go through [`VideoAnalyzer`], which
//! owns the upload/poll/cleanup lifecycle of the remote file.

pub mod account;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod merge;
pub mod normalize;
pub mod parse;
pub mod prompts;
pub mod provider;
pub mod result;
pub mod schema;
pub mod task;
pub mod video;

pub use account::{account_metrics_from, AccountSubject};
pub use error::VisionError;
pub use extract::{sniff_image_mime, ImageBatchAnalysis, VisionExtractor};
pub use gemini::GeminiClient;
pub use merge::{merge, CombinedResult};
pub use provider::{FileState, MediaPart, RemoteFile, UploadMetadata, VisionProvider};
pub use result::{ExtractionFailure, ExtractionResult, FailureKind};
pub use schema::{FieldKind, FieldSpec, TaskSchema};
pub use task::{ExtractionTask, UnknownTask};
pub use video::{mime_for_file_name, PollConfig, VideoAnalyzer};
