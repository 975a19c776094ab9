//! End-to-end pipeline runner: convert a local video, upload it, request a
//! transcription, then stream a completion to stdout.

use anyhow::Result;
use clap::{Arg, Command};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use vidscribe::{
    ApiClient, CompletionBuffer, Config, MediaAsset, PipelineRun, Transcoder,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("vidscribe=info,warn")
        .init();

    let matches = Command::new("run-pipeline")
        .version("0.1.0")
        .about("Run the full video-to-completion pipeline against a vidscribe server")
        .arg(
            Arg::new("video")
                .long("video")
                .value_name("FILE")
                .help("Video file to process")
                .required(true),
        )
        .arg(
            Arg::new("server")
                .long("server")
                .value_name("URL")
                .help("Base URL of the vidscribe server")
                .default_value("http://localhost:3333"),
        )
        .arg(
            Arg::new("hint")
                .long("hint")
                .value_name("TEXT")
                .help("Vocabulary hint forwarded to the transcription engine")
                .default_value(""),
        )
        .arg(
            Arg::new("prompt")
                .long("prompt")
                .value_name("TEMPLATE")
                .help("Completion prompt template containing the transcription placeholder"),
        )
        .arg(
            Arg::new("temperature")
                .long("temperature")
                .value_name("NUM")
                .help("Sampling temperature in [0,1]")
                .default_value("0.5"),
        )
        .get_matches();

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    let video_path = PathBuf::from(matches.get_one::<String>("video").unwrap());
    let server = matches.get_one::<String>("server").unwrap();
    let hint = matches.get_one::<String>("hint").unwrap();
    let temperature: f32 = matches.get_one::<String>("temperature").unwrap().parse()?;
    let prompt = matches
        .get_one::<String>("prompt")
        .cloned()
        .unwrap_or_else(|| format!("Summarize the video below.\n\n{}", config.prompt.placeholder));

    info!("📼 Loading video: {}", video_path.display());
    let video = MediaAsset::from_file(&video_path).await?;

    // Advisory conversion progress
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(percent) = progress_rx.recv().await {
            info!("🎵 Convert progress: {}%", percent);
        }
    });

    let converter = Arc::new(Transcoder::new(config.audio.clone()).with_progress(progress_tx));
    let client = Arc::new(
        ApiClient::new(server.clone())?
            .with_request_timeout(Duration::from_secs(config.transcription.timeout_seconds)),
    );

    let run = PipelineRun::new(converter, Arc::clone(&client)).on_success(Box::new(|id| {
        info!("🎉 Video record ready: {}", id);
    }));

    let record_id = run.submit(video, hint).await?;

    info!("🤖 Requesting completion (temperature {})", temperature);

    // Print chunks as they arrive
    let buffer = CompletionBuffer::new();
    let mut updates = buffer.subscribe();
    let printer = tokio::spawn(async move {
        let mut printed = 0;
        while updates.changed().await.is_ok() {
            let text = updates.borrow_and_update().clone();
            print!("{}", &text[printed..]);
            let _ = std::io::stdout().flush();
            printed = text.len();
        }
    });

    client
        .stream_completion(record_id, &prompt, temperature, &buffer)
        .await?;

    drop(buffer);
    let _ = printer.await;
    println!();

    Ok(())
}
