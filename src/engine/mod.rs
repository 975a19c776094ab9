//! External engine interfaces
//!
//! Speech-to-text and language-model services sit behind these traits; the
//! rest of the crate only ever sees trait objects.

pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::Result;

/// One incremental unit of completion text, or the failure that ended the stream
pub type ChunkResult = Result<String>;

/// Receiver half of a completion chunk stream
pub type ChunkReceiver = mpsc::Receiver<ChunkResult>;

/// Speech-to-text engine
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribe an audio payload. `prompt_hint` is free-form guidance text
    /// (domain vocabulary) forwarded to the engine to improve accuracy.
    async fn transcribe(&self, audio: &[u8], media_type: &str, prompt_hint: &str)
        -> Result<String>;
}

/// Language-model completion engine invoked in streaming mode
#[async_trait]
pub trait CompletionEngine: Send + Sync {
    /// Start a streaming completion. Chunks arrive on the returned channel in
    /// emission order; an `Err` item or channel closure ends the stream.
    async fn stream_complete(&self, prompt: &str, temperature: f32) -> Result<ChunkReceiver>;
}

/// Engine pair resolved from configuration
#[derive(Clone)]
pub struct Engines {
    pub transcription: Arc<dyn TranscriptionEngine>,
    pub completion: Arc<dyn CompletionEngine>,
}

/// Create engine instances based on configuration
pub fn create_engines(config: &Config) -> Result<Engines> {
    Ok(Engines {
        transcription: Arc::new(openai::OpenAiTranscriptionEngine::new(
            config.transcription.clone(),
        )?),
        completion: Arc::new(openai::OpenAiCompletionEngine::new(config.llm.clone())?),
    })
}
