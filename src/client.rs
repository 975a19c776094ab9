//! HTTP client for the vidscribe server
//!
//! Covers the three client-side network stages: uploading converted audio,
//! requesting a transcription for the stored record, and consuming the
//! streamed completion into a live text buffer.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::media::AudioArtifact;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    video: UploadedVideo,
}

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: Uuid,
}

#[derive(Debug, Serialize)]
struct TranscriptionRequest {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequestBody {
    #[serde(rename = "videoId")]
    video_id: Uuid,
    prompt: String,
    temperature: f32,
}

/// Client for the vidscribe HTTP API
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    /// Per-request deadline for the non-streaming calls
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PipelineError::Upload(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            request_timeout: Duration::from_secs(300),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Upload converted audio; returns the freshly minted record id
    pub async fn upload(&self, audio: &AudioArtifact) -> Result<Uuid> {
        let file_part = reqwest::multipart::Part::bytes(audio.data.clone())
            .file_name("audio.mp3")
            .mime_str(&audio.media_type)
            .map_err(|e| PipelineError::Upload(e.to_string()))?;

        let form = reqwest::multipart::Form::new().part("file", file_part);

        debug!("Uploading {} audio bytes", audio.byte_len());

        let response = self
            .client
            .post(format!("{}/video", self.base_url))
            .timeout(self.request_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Upload(format!(
                "upload rejected with {}: {}",
                status, text
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Upload(e.to_string()))?;

        info!("📤 Uploaded audio as video record {}", parsed.video.id);
        Ok(parsed.video.id)
    }

    /// Ask the server to transcribe the stored audio for `video_id`.
    ///
    /// `prompt_hint` is vocabulary guidance for the transcription engine, not
    /// the completion prompt. Completion is signaled by this call resolving;
    /// the text itself stays server-side.
    pub async fn request_transcription(&self, video_id: Uuid, prompt_hint: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/video/{}/transcription", self.base_url, video_id))
            .timeout(self.request_timeout)
            .json(&TranscriptionRequest {
                prompt: prompt_hint.to_string(),
            })
            .send()
            .await
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                info!("📝 Transcription stored for video {}", video_id);
                Ok(())
            }
            reqwest::StatusCode::NOT_FOUND => {
                Err(PipelineError::NotFound(format!("video {}", video_id)))
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(PipelineError::Transcription(format!(
                    "transcription request failed with {}: {}",
                    status, text
                )))
            }
        }
    }

    /// Stream a completion into `buffer`, chunk by chunk in arrival order.
    ///
    /// A mid-stream transport failure terminates consumption but leaves the
    /// already-delivered text in the buffer.
    pub async fn stream_completion(
        &self,
        video_id: Uuid,
        prompt: &str,
        temperature: f32,
        buffer: &CompletionBuffer,
    ) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/ai/complete", self.base_url))
            .json(&CompletionRequestBody {
                video_id,
                prompt: prompt.to_string(),
                temperature,
            })
            .send()
            .await
            .map_err(|e| PipelineError::EngineStream(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            reqwest::StatusCode::NOT_FOUND => {
                return Err(PipelineError::NotFound(format!("video {}", video_id)));
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                return Err(PipelineError::Validation(format!(
                    "completion rejected with {}: {}",
                    status, text
                )));
            }
        }

        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PipelineError::EngineStream(e.to_string()))?;
            buffer.append(&String::from_utf8_lossy(&chunk));
        }

        Ok(())
    }
}

/// Accumulating completion text exposed for live display.
///
/// Chunks are appended in arrival order; observers watch the buffer grow
/// through the subscription channel.
#[derive(Debug, Clone)]
pub struct CompletionBuffer {
    text: watch::Sender<String>,
}

impl CompletionBuffer {
    pub fn new() -> Self {
        let (text, _) = watch::channel(String::new());
        Self { text }
    }

    /// Append one chunk; concatenation only, never reordering
    pub fn append(&self, chunk: &str) {
        self.text.send_modify(|buffer| buffer.push_str(chunk));
    }

    /// Current accumulated text
    pub fn snapshot(&self) -> String {
        self.text.borrow().clone()
    }

    /// Subscribe to buffer updates for live rendering
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.text.subscribe()
    }
}

impl Default for CompletionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_preserves_chunk_order() {
        let buffer = CompletionBuffer::new();
        let expected = "Hello, world";

        for chunk in ["Hel", "lo, ", "world"] {
            buffer.append(chunk);
            // Every intermediate state is a strict prefix of the final text
            assert!(expected.starts_with(&buffer.snapshot()));
        }

        assert_eq!(buffer.snapshot(), expected);
    }

    #[tokio::test]
    async fn test_buffer_subscription_sees_updates() {
        let buffer = CompletionBuffer::new();
        let mut rx = buffer.subscribe();

        buffer.append("chunk");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_str(), "chunk");
    }

    #[test]
    fn test_api_client_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:3333/").unwrap();
        assert_eq!(client.base_url, "http://localhost:3333");
    }
}
