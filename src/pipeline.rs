//! Client-side pipeline state machine
//!
//! Drives one run through convert → upload → transcription-request in strict
//! sequence. A stage failure leaves the status at the stage that failed;
//! `reset` re-arms the run for resubmission.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audio::MediaConverter;
use crate::client::ApiClient;
use crate::error::{PipelineError, Result};
use crate::media::MediaAsset;

/// Status of one pipeline run, observed by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Waiting,
    Converting,
    Uploading,
    Generating,
    Success,
}

impl PipelineStatus {
    /// Legal forward transitions; everything else is rejected
    pub fn can_advance_to(self, next: PipelineStatus) -> bool {
        matches!(
            (self, next),
            (PipelineStatus::Waiting, PipelineStatus::Converting)
                | (PipelineStatus::Converting, PipelineStatus::Uploading)
                | (PipelineStatus::Uploading, PipelineStatus::Generating)
                | (PipelineStatus::Generating, PipelineStatus::Success)
        )
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStatus::Waiting => "waiting",
            PipelineStatus::Converting => "converting",
            PipelineStatus::Uploading => "uploading",
            PipelineStatus::Generating => "generating",
            PipelineStatus::Success => "success",
        };
        write!(f, "{}", name)
    }
}

/// Callback invoked with the new record id when a run reaches `success`
pub type SuccessCallback = Box<dyn Fn(Uuid) + Send + Sync>;

/// One user-initiated run of the media-to-text pipeline
pub struct PipelineRun {
    converter: Arc<dyn MediaConverter>,
    client: Arc<ApiClient>,
    status: watch::Sender<PipelineStatus>,
    /// Every status this run has passed through, in order
    history: Mutex<Vec<PipelineStatus>>,
    /// Serializes submissions; a second submit while one is in flight is rejected
    run_guard: tokio::sync::Mutex<()>,
    on_success: Option<SuccessCallback>,
}

impl PipelineRun {
    pub fn new(converter: Arc<dyn MediaConverter>, client: Arc<ApiClient>) -> Self {
        let (status, _) = watch::channel(PipelineStatus::Waiting);
        Self {
            converter,
            client,
            status,
            history: Mutex::new(vec![PipelineStatus::Waiting]),
            run_guard: tokio::sync::Mutex::new(()),
            on_success: None,
        }
    }

    /// Register a callback fired with the record id when the run succeeds
    pub fn on_success(mut self, callback: SuccessCallback) -> Self {
        self.on_success = Some(callback);
        self
    }

    pub fn status(&self) -> PipelineStatus {
        *self.status.borrow()
    }

    /// Subscribe to live status updates
    pub fn subscribe(&self) -> watch::Receiver<PipelineStatus> {
        self.status.subscribe()
    }

    /// Every status observed so far, in transition order
    pub fn history(&self) -> Vec<PipelineStatus> {
        self.history.lock().expect("status history poisoned").clone()
    }

    /// Re-arm a finished or failed run for resubmission
    pub fn reset(&self) {
        self.status.send_replace(PipelineStatus::Waiting);
        self.history
            .lock()
            .expect("status history poisoned")
            .push(PipelineStatus::Waiting);
    }

    fn advance(&self, next: PipelineStatus) -> Result<()> {
        let current = self.status();
        if !current.can_advance_to(next) {
            return Err(PipelineError::Validation(format!(
                "illegal status transition {} -> {}",
                current, next
            )));
        }

        self.status.send_replace(next);
        self.history
            .lock()
            .expect("status history poisoned")
            .push(next);
        info!("▶️  Pipeline status: {}", next);

        Ok(())
    }

    /// Run the full pipeline for one video: convert, upload, request
    /// transcription. Returns the record id on success.
    ///
    /// May only be called while the status is `waiting`; a failed run keeps
    /// the status of the stage that failed until `reset` is called.
    pub async fn submit(&self, video: MediaAsset, prompt_hint: &str) -> Result<Uuid> {
        let _running = self.run_guard.try_lock().map_err(|_| {
            PipelineError::Validation("a pipeline run is already in progress".to_string())
        })?;

        if self.status() != PipelineStatus::Waiting {
            return Err(PipelineError::Validation(format!(
                "cannot submit while status is {}",
                self.status()
            )));
        }

        self.advance(PipelineStatus::Converting)?;
        let audio = self.converter.convert(&video).await.inspect_err(|e| {
            warn!("Conversion stage failed: {}", e);
        })?;

        self.advance(PipelineStatus::Uploading)?;
        let record_id = self.client.upload(&audio).await.inspect_err(|e| {
            warn!("Upload stage failed: {}", e);
        })?;
        // Audio artifact is dropped here; it exists only to be uploaded
        drop(audio);

        self.advance(PipelineStatus::Generating)?;
        self.client
            .request_transcription(record_id, prompt_hint)
            .await
            .inspect_err(|e| {
                warn!("Transcription stage failed: {}", e);
            })?;

        self.advance(PipelineStatus::Success)?;
        info!("🎉 Pipeline run finished, record {}", record_id);

        if let Some(callback) = &self.on_success {
            callback(record_id);
        }

        Ok(record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use PipelineStatus::*;

        assert!(Waiting.can_advance_to(Converting));
        assert!(Converting.can_advance_to(Uploading));
        assert!(Uploading.can_advance_to(Generating));
        assert!(Generating.can_advance_to(Success));

        // No skips, repeats, or reversals
        assert!(!Waiting.can_advance_to(Uploading));
        assert!(!Converting.can_advance_to(Converting));
        assert!(!Success.can_advance_to(Waiting));
        assert!(!Generating.can_advance_to(Converting));
        assert!(!Success.can_advance_to(Converting));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&PipelineStatus::Generating).unwrap();
        assert_eq!(json, "\"generating\"");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PipelineStatus::Waiting.to_string(), "waiting");
        assert_eq!(PipelineStatus::Success.to_string(), "success");
    }
}
