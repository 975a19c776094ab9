use serde::{Deserialize, Serialize};

/// A user-selected video, held in memory for the duration of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Original file name (for diagnostics only)
    pub filename: String,
    /// Declared media type, e.g. "video/mp4"
    pub media_type: String,
    /// Raw video bytes
    pub data: Vec<u8>,
}

impl MediaAsset {
    pub fn new(filename: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            data,
        }
    }

    /// Load a video file from disk
    pub async fn from_file(path: &std::path::Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video.mp4".to_string());

        Ok(Self::new(filename, "video/mp4", data))
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Compressed audio derived from exactly one [`MediaAsset`].
///
/// Lives only in memory; discarded once uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioArtifact {
    /// Media type of the encoded audio, e.g. "audio/mpeg"
    pub media_type: String,
    /// Encoded audio bytes
    pub data: Vec<u8>,
}

impl AudioArtifact {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn is_audio(&self) -> bool {
        self.media_type.starts_with("audio/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_asset_byte_len() {
        let asset = MediaAsset::new("clip.mp4", "video/mp4", vec![0u8; 128]);
        assert_eq!(asset.byte_len(), 128);
        assert_eq!(asset.media_type, "video/mp4");
    }

    #[test]
    fn test_audio_artifact_is_audio() {
        let artifact = AudioArtifact::new("audio/mpeg", vec![1, 2, 3]);
        assert!(artifact.is_audio());
        assert_eq!(artifact.byte_len(), 3);

        let not_audio = AudioArtifact::new("video/mp4", vec![1]);
        assert!(!not_audio.is_audio());
    }
}
