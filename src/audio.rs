//! Audio extraction from video via ffmpeg
//!
//! The transcoder strips the video stream and re-encodes the audio track at a
//! low bitrate tuned for speech intelligibility, not playback quality. All
//! intermediate files live in a scratch directory scoped to one conversion
//! call, so they are removed on every exit path including ffmpeg failure.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::{mpsc, OnceCell};
use tracing::{debug, info};

use crate::config::AudioConfig;
use crate::error::{PipelineError, Result};
use crate::media::{AudioArtifact, MediaAsset};

/// Video-to-audio conversion seam; lets tests substitute a fake converter
#[async_trait]
pub trait MediaConverter: Send + Sync {
    async fn convert(&self, video: &MediaAsset) -> Result<AudioArtifact>;
}

/// ffmpeg-backed transcoder
pub struct Transcoder {
    config: AudioConfig,
    /// Advisory progress events (0-100), never affects control flow
    progress: Option<mpsc::UnboundedSender<u8>>,
    /// One-time ffmpeg availability probe
    ffmpeg_ready: OnceCell<()>,
}

impl Transcoder {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            progress: None,
            ffmpeg_ready: OnceCell::new(),
        }
    }

    /// Attach a progress event sink (percentages 0-100, advisory only)
    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<u8>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Probe ffmpeg availability once per transcoder instance
    async fn ensure_ffmpeg(&self) -> Result<()> {
        self.ffmpeg_ready
            .get_or_try_init(|| async {
                let output = tokio::process::Command::new("ffmpeg")
                    .arg("-version")
                    .output()
                    .await
                    .map_err(|e| {
                        PipelineError::Conversion(format!("ffmpeg not available: {}", e))
                    })?;

                if !output.status.success() {
                    return Err(PipelineError::Conversion(
                        "ffmpeg -version exited with an error".to_string(),
                    ));
                }

                debug!("ffmpeg probe succeeded");
                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Probe the input duration so progress can be reported as a percentage
    async fn probe_duration(&self, input: &std::path::Path) -> Option<Duration> {
        let output = tokio::process::Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                input.to_str()?,
            ])
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
        let seconds: f64 = json["format"]["duration"].as_str()?.parse().ok()?;

        Some(Duration::from_secs_f64(seconds))
    }

    fn emit_progress(&self, percent: u8) {
        if let Some(sender) = &self.progress {
            let _ = sender.send(percent.min(100));
        }
    }
}

#[async_trait]
impl MediaConverter for Transcoder {
    async fn convert(&self, video: &MediaAsset) -> Result<AudioArtifact> {
        self.ensure_ffmpeg().await?;

        info!(
            "🎵 Converting {} ({} bytes) to {} audio",
            video.filename,
            video.byte_len(),
            self.config.output_media_type
        );

        // Scratch dir doubles as the transcoder's private filesystem; dropped
        // (and removed) on every return path below
        let scratch = tempfile::TempDir::new()?;
        let input_path = scratch.path().join("input.mp4");
        let output_path = scratch.path().join("output.mp3");

        tokio::fs::write(&input_path, &video.data).await?;

        let total_duration = self.probe_duration(&input_path).await;

        let mut child = tokio::process::Command::new("ffmpeg")
            .args([
                "-i",
                input_path.to_str().unwrap_or_default(),
                "-map",
                "0:a",
                "-b:a",
                &self.config.bitrate,
                "-acodec",
                &self.config.codec,
                "-progress",
                "pipe:1",
                "-nostats",
                "-y",
                output_path.to_str().unwrap_or_default(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PipelineError::Conversion(format!("failed to spawn ffmpeg: {}", e)))?;

        let stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        // Drain stderr concurrently so a chatty ffmpeg cannot stall on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut text = String::new();
            if let Some(stderr) = stderr.as_mut() {
                let _ = stderr.read_to_string(&mut text).await;
            }
            text
        });

        let convert_deadline = Duration::from_secs(self.config.convert_timeout_seconds);
        let status = tokio::time::timeout(convert_deadline, async {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    // ffmpeg -progress emits key=value lines; out_time_ms is microseconds
                    if let Some(value) = line.strip_prefix("out_time_ms=") {
                        if let (Ok(elapsed_us), Some(total)) =
                            (value.trim().parse::<u64>(), total_duration)
                        {
                            let total_us = total.as_micros().max(1) as u64;
                            let percent = (elapsed_us.saturating_mul(100) / total_us).min(100);
                            self.emit_progress(percent as u8);
                        }
                    }
                }
            }

            child.wait().await
        })
        .await
        .map_err(|_| {
            PipelineError::Conversion(format!(
                "conversion timed out after {}s",
                self.config.convert_timeout_seconds
            ))
        })??;

        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let detail = stderr_text.lines().last().unwrap_or("unknown ffmpeg error");
            return Err(PipelineError::Conversion(format!(
                "ffmpeg failed for {}: {}",
                video.filename, detail
            )));
        }

        let data = tokio::fs::read(&output_path).await.map_err(|e| {
            PipelineError::Conversion(format!("failed to read converted audio: {}", e))
        })?;

        if data.is_empty() {
            return Err(PipelineError::Conversion(format!(
                "conversion produced no audio for {}",
                video.filename
            )));
        }

        self.emit_progress(100);
        info!("✅ Conversion finished: {} audio bytes", data.len());

        Ok(AudioArtifact::new(
            self.config.output_media_type.clone(),
            data,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn ffmpeg_available() -> bool {
        tokio::process::Command::new("ffmpeg")
            .arg("-version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_convert_rejects_garbage_input() {
        if !ffmpeg_available().await {
            return;
        }

        let transcoder = Transcoder::new(Config::default().audio);
        let video = MediaAsset::new("garbage.mp4", "video/mp4", vec![0u8; 64]);

        let result = transcoder.convert(&video).await;
        assert!(matches!(result, Err(PipelineError::Conversion(_))));
    }

    #[tokio::test]
    async fn test_convert_silent_video_yields_audio() {
        if !ffmpeg_available().await {
            return;
        }

        // Render a 5-second silent test clip
        let scratch = tempfile::TempDir::new().unwrap();
        let clip_path = scratch.path().join("silent.mp4");
        let status = tokio::process::Command::new("ffmpeg")
            .args([
                "-f",
                "lavfi",
                "-i",
                "anullsrc=r=16000:cl=mono",
                "-f",
                "lavfi",
                "-i",
                "color=c=black:s=64x64:r=10",
                "-t",
                "5",
                "-c:a",
                "aac",
                "-c:v",
                "libx264",
                "-y",
                clip_path.to_str().unwrap(),
            ])
            .output()
            .await
            .unwrap()
            .status;

        if !status.success() {
            // Encoder set unavailable on this host
            return;
        }

        let video = MediaAsset::from_file(&clip_path).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let transcoder = Transcoder::new(Config::default().audio).with_progress(tx);

        let artifact = transcoder.convert(&video).await.unwrap();
        assert!(artifact.byte_len() > 0);
        assert!(artifact.is_audio());

        // Progress events are advisory; when emitted they stay within range
        while let Ok(percent) = rx.try_recv() {
            assert!(percent <= 100);
        }
    }
}
