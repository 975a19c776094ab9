//! API request handlers

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::Engines;
use crate::error::PipelineError;
use crate::prompt::{resolve_prompt, PromptCatalog};
use crate::store::VideoStore;

use super::models::{
    CompleteRequest, CreateTranscriptionRequest, CreateTranscriptionResponse, ErrorBody,
    UploadVideoResponse, UploadedVideo,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: VideoStore,
    pub engines: Engines,
    pub catalog: Arc<PromptCatalog>,
    pub config: Arc<Config>,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match &self {
            PipelineError::Validation(_) | PipelineError::Precondition(_) => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::Transcription(_) | PipelineError::EngineStream(_) => {
                StatusCode::BAD_GATEWAY
            }
            PipelineError::Io(_) | PipelineError::Conversion(_) | PipelineError::Upload(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Service banner
pub async fn root() -> impl IntoResponse {
    "vidscribe API"
}

/// List the prompt template catalog
pub async fn list_prompts(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.list().to_vec())
}

/// Accept a multipart audio upload and create a video record
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, PipelineError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::Validation(format!("malformed multipart payload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let media_type = field
            .content_type()
            .map(|t| t.to_string())
            .unwrap_or_else(|| state.config.audio.output_media_type.clone());

        let data = field
            .bytes()
            .await
            .map_err(|e| PipelineError::Validation(format!("failed to read upload: {}", e)))?;

        if data.is_empty() {
            return Err(PipelineError::Validation(
                "uploaded file field is empty".to_string(),
            ));
        }

        let record = state.store.create(data.to_vec(), media_type).await;

        return Ok((
            StatusCode::CREATED,
            Json(UploadVideoResponse {
                video: UploadedVideo { id: record.id },
            }),
        ));
    }

    Err(PipelineError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}

/// Transcribe the stored audio for a record and persist the text
pub async fn create_transcription(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Json(request): Json<CreateTranscriptionRequest>,
) -> Result<Json<CreateTranscriptionResponse>, PipelineError> {
    let record = state.store.get(video_id).await?;

    info!("🎤 Transcribing video {} ({} audio bytes)", video_id, record.audio.len());

    let transcription = state
        .engines
        .transcription
        .transcribe(&record.audio, &record.media_type, &request.prompt)
        .await?;

    state
        .store
        .set_transcription(video_id, transcription.clone())
        .await?;

    Ok(Json(CreateTranscriptionResponse { transcription }))
}

/// Stream a completion for a transcribed video.
///
/// Chunks are relayed in arrival order as a chunked text body. A mid-stream
/// engine failure ends the body early; chunks already sent stand.
pub async fn complete(
    State(state): State<AppState>,
    Json(request): Json<CompleteRequest>,
) -> Result<Response, PipelineError> {
    let temperature = request
        .temperature
        .unwrap_or(state.config.llm.default_temperature);

    if !(0.0..=1.0).contains(&temperature) {
        return Err(PipelineError::Validation(format!(
            "temperature must be within [0,1], got {}",
            temperature
        )));
    }

    let record = state.store.get(request.video_id).await?;

    let transcription = record.transcription.as_deref().ok_or_else(|| {
        PipelineError::Precondition(format!(
            "transcription not ready for video {}",
            request.video_id
        ))
    })?;

    let final_prompt = resolve_prompt(
        &request.prompt,
        transcription,
        &state.config.prompt.placeholder,
    )?;

    info!(
        "🤖 Streaming completion for video {} (temperature {})",
        request.video_id, temperature
    );

    let chunks = state
        .engines
        .completion
        .stream_complete(&final_prompt, temperature)
        .await
        .inspect_err(|e| warn!("Completion handshake failed: {}", e))?;

    // An Err item aborts the chunked body mid-stream; the transport closes
    // the connection and the caller keeps what was already delivered
    let body = Body::from_stream(ReceiverStream::new(chunks));

    let response = (
        StatusCode::OK,
        [
            ("content-type", "text/plain; charset=utf-8"),
            ("access-control-allow-origin", "*"),
            (
                "access-control-allow-methods",
                "GET, POST, PUT, DELETE, OPTIONS",
            ),
        ],
        body,
    );

    Ok(response.into_response())
}
