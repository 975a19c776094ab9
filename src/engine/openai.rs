//! OpenAI-compatible engine implementations

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{ChunkReceiver, CompletionEngine, TranscriptionEngine};
use crate::config::{LlmConfig, TranscriptionConfig};
use crate::error::{PipelineError, Result};

/// Whisper-style transcription over the OpenAI audio API
pub struct OpenAiTranscriptionEngine {
    config: TranscriptionConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl OpenAiTranscriptionEngine {
    pub fn new(config: TranscriptionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl TranscriptionEngine for OpenAiTranscriptionEngine {
    async fn transcribe(
        &self,
        audio: &[u8],
        media_type: &str,
        prompt_hint: &str,
    ) -> Result<String> {
        let file_part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.mp3")
            .mime_str(media_type)
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("response_format", "json")
            .text("temperature", "0")
            .text("prompt", prompt_hint.to_string());

        if let Some(language) = &self.config.language {
            form = form.text("language", language.clone());
        }

        debug!("Sending transcription request to {}", self.config.endpoint);

        let mut request = self.client.post(&self.config.endpoint).multipart(form);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Transcription(format!(
                "transcription API error {}: {}",
                status, text
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;

        Ok(parsed.text)
    }
}

/// Chat-completions streaming over the OpenAI API
pub struct OpenAiCompletionEngine {
    config: LlmConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl OpenAiCompletionEngine {
    pub fn new(config: LlmConfig) -> Result<Self> {
        // A whole-request timeout would cut long streams mid-body, so only
        // the connect phase is bounded here
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PipelineError::EngineStream(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl CompletionEngine for OpenAiCompletionEngine {
    async fn stream_complete(&self, prompt: &str, temperature: f32) -> Result<ChunkReceiver> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature,
            stream: true,
        };

        debug!("Sending streaming completion request to {}", self.config.endpoint);

        let mut http_request = self.client.post(&self.config.endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        // Handshake failures surface to the caller before any chunk is emitted
        let response = http_request
            .send()
            .await
            .map_err(|e| PipelineError::EngineStream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::EngineStream(format!(
                "completion API error {}: {}",
                status, text
            )));
        }

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut line_buffer = String::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("Completion stream error: {}", e);
                        let _ = tx.send(Err(PipelineError::EngineStream(e.to_string()))).await;
                        return;
                    }
                };

                line_buffer.push_str(&String::from_utf8_lossy(&chunk));

                // SSE frames can split across transport chunks; only consume
                // lines that are complete
                while let Some(newline) = line_buffer.find('\n') {
                    let line = line_buffer[..newline].trim().to_string();
                    line_buffer.drain(..=newline);

                    let Some(payload) = line.strip_prefix("data: ") else {
                        continue;
                    };

                    if payload == "[DONE]" {
                        return;
                    }

                    if let Ok(json) = serde_json::from_str::<serde_json::Value>(payload) {
                        if let Some(delta) = json["choices"][0]["delta"]["content"].as_str() {
                            if tx.send(Ok(delta.to_string())).await.is_err() {
                                // Caller hung up; stop relaying
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}
