//! In-memory video record store
//!
//! Each record's audio is written once at creation and its transcription at
//! most once afterwards, so the map-level RwLock is the only coordination
//! needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PipelineError, Result};

/// Server-side record for one uploaded audio artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Unique identifier, minted at creation
    pub id: Uuid,

    /// Stored audio bytes
    #[serde(skip_serializing, default)]
    pub audio: Vec<u8>,

    /// Media type of the stored audio
    pub media_type: String,

    /// Transcription text, absent until transcription completes
    pub transcription: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Thread-safe store of video records, keyed by id
#[derive(Debug, Clone, Default)]
pub struct VideoStore {
    records: Arc<RwLock<HashMap<Uuid, VideoRecord>>>,
}

impl VideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for an uploaded audio payload and mint its id
    pub async fn create(&self, audio: Vec<u8>, media_type: impl Into<String>) -> VideoRecord {
        let record = VideoRecord {
            id: Uuid::new_v4(),
            audio,
            media_type: media_type.into(),
            transcription: None,
            created_at: Utc::now(),
        };

        self.records.write().await.insert(record.id, record.clone());
        info!("🆕 Created video record {}", record.id);

        record
    }

    /// Fetch a record by id
    pub async fn get(&self, id: Uuid) -> Result<VideoRecord> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("video {}", id)))
    }

    /// Store the transcription text for an existing record.
    ///
    /// Written at most once per record in practice; a repeat call simply
    /// overwrites, there is no second writer to race with.
    pub async fn set_transcription(&self, id: Uuid, transcription: String) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| PipelineError::NotFound(format!("video {}", id)))?;

        record.transcription = Some(transcription);
        debug!("💾 Stored transcription for video {}", id);

        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_record() {
        let store = VideoStore::new();
        assert!(store.is_empty().await);

        let record = store.create(vec![1, 2, 3], "audio/mpeg").await;

        let fetched = store.get(record.id).await.unwrap();
        assert_eq!(fetched.id, record.id);
        assert_eq!(fetched.audio, vec![1, 2, 3]);
        assert!(fetched.transcription.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let store = VideoStore::new();
        let result = store.get(Uuid::new_v4()).await;
        assert!(matches!(result, Err(PipelineError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_transcription() {
        let store = VideoStore::new();
        let record = store.create(vec![0u8; 4], "audio/mpeg").await;

        store
            .set_transcription(record.id, "hello".to_string())
            .await
            .unwrap();

        let fetched = store.get(record.id).await.unwrap();
        assert_eq!(fetched.transcription.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_set_transcription_unknown_id() {
        let store = VideoStore::new();
        let result = store
            .set_transcription(Uuid::new_v4(), "text".to_string())
            .await;
        assert!(matches!(result, Err(PipelineError::NotFound(_))));
    }
}
