//! API request/response models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response body for `POST /video`
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadVideoResponse {
    pub video: UploadedVideo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadedVideo {
    pub id: Uuid,
}

/// Request body for `POST /video/:videoId/transcription`
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTranscriptionRequest {
    /// Free-form vocabulary guidance for the transcription engine
    pub prompt: String,
}

/// Response body for `POST /video/:videoId/transcription`
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTranscriptionResponse {
    pub transcription: String,
}

/// Request body for `POST /ai/complete`
#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteRequest {
    #[serde(rename = "videoId")]
    pub video_id: Uuid,
    pub prompt: String,
    /// Sampling temperature in [0,1]; server default applies when omitted
    pub temperature: Option<f32>,
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_request_accepts_missing_temperature() {
        let json = format!(r#"{{"videoId":"{}","prompt":"p"}}"#, Uuid::new_v4());
        let request: CompleteRequest = serde_json::from_str(&json).unwrap();
        assert!(request.temperature.is_none());
    }

    #[test]
    fn test_complete_request_rejects_malformed_uuid() {
        let json = r#"{"videoId":"not-a-uuid","prompt":"p","temperature":0.5}"#;
        assert!(serde_json::from_str::<CompleteRequest>(json).is_err());
    }

    #[test]
    fn test_upload_response_shape() {
        let id = Uuid::new_v4();
        let response = UploadVideoResponse {
            video: UploadedVideo { id },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["video"]["id"], serde_json::json!(id.to_string()));
    }
}
