/// vidscribe - video-to-text AI pipeline
///
/// Converts a local video into compressed audio client-side, uploads it for
/// transcription, and streams a language-model completion seeded by the
/// transcription and a user prompt.

pub mod api;
pub mod audio;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod prompt;
pub mod store;

// Re-export main types for easy access
pub use crate::api::ApiServer;
pub use crate::audio::{MediaConverter, Transcoder};
pub use crate::client::{ApiClient, CompletionBuffer};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::engine::{create_engines, CompletionEngine, Engines, TranscriptionEngine};
pub use crate::error::{PipelineError, Result};
pub use crate::media::{AudioArtifact, MediaAsset};
pub use crate::pipeline::{PipelineRun, PipelineStatus};
pub use crate::prompt::{resolve_prompt, PromptCatalog, PromptTemplate};
pub use crate::store::{VideoRecord, VideoStore};
