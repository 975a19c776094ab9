use anyhow::Result;
use clap::{Arg, Command};
use std::sync::Arc;
use tracing::{info, warn};

use vidscribe::{create_engines, ApiServer, Config, VideoStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("vidscribe=info,warn")
        .init();

    let matches = Command::new("vidscribe")
        .version("0.1.0")
        .about("Video-to-text AI pipeline server")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to listen on (overrides configuration)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("verbose") {
        info!("Verbose logging enabled");
    }

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(port) = matches.get_one::<String>("port") {
        config.server.port = port.parse()?;
    }

    config.validate()?;

    info!("🚀 vidscribe server starting...");
    info!("🔧 LLM model: {}", config.llm.model);
    info!("🔧 Transcription model: {}", config.transcription.model);
    info!("🔧 Prompt placeholder: {}", config.prompt.placeholder);

    let engines = create_engines(&config)?;
    let store = VideoStore::new();

    let server = ApiServer::new(store, engines, Arc::new(config));
    server.start().await
}
