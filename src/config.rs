use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the vidscribe pipeline and server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Audio conversion settings
    pub audio: AudioConfig,

    /// Transcription engine settings
    pub transcription: TranscriptionConfig,

    /// Completion engine settings
    pub llm: LlmConfig,

    /// Prompt template settings
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the HTTP server listens on
    pub port: u16,

    /// Bind address
    pub bind_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Target audio bitrate, ffmpeg syntax (speech intelligibility, not playback quality)
    pub bitrate: String,

    /// Target audio codec
    pub codec: String,

    /// Media type of converted output
    pub output_media_type: String,

    /// Timeout for a single conversion (seconds)
    pub convert_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// API endpoint for the transcription engine
    pub endpoint: String,

    /// API key for the transcription engine
    pub api_key: Option<String>,

    /// Model to use for transcription
    pub model: String,

    /// Language hint for transcription
    pub language: Option<String>,

    /// Request timeout (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API endpoint for the completion engine (chat completions)
    pub endpoint: String,

    /// API key for the completion engine
    pub api_key: Option<String>,

    /// Model to use for completions
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Default sampling temperature when the caller omits one
    pub default_temperature: f32,

    /// Request timeout (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Placeholder token substituted with the stored transcription.
    /// Configurable so deployments with legacy templates can align the
    /// exact spelling their template authors used.
    pub placeholder: String,
}

impl Config {
    /// Ordered config file search path, most specific first
    fn search_paths() -> Vec<std::path::PathBuf> {
        let mut paths = vec![
            std::path::PathBuf::from("vidscribe.toml"),
            std::path::PathBuf::from("config/vidscribe.toml"),
        ];

        if let Ok(home) = std::env::var("HOME") {
            paths.push(
                std::path::Path::new(&home).join(".config/vidscribe/config.toml"),
            );
        }

        paths.push(std::path::PathBuf::from("/etc/vidscribe/config.toml"));
        paths
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if let Ok(config_str) = std::fs::read_to_string(&path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Fall back to environment variables over defaults
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("VIDSCRIBE_PORT") {
            config.server.port = port.parse().unwrap_or(3333);
        }

        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            config.transcription.api_key = Some(api_key.clone());
            config.llm.api_key = Some(api_key);
        }

        if let Ok(model) = std::env::var("VIDSCRIBE_LLM_MODEL") {
            config.llm.model = model;
        }

        if let Ok(placeholder) = std::env::var("VIDSCRIBE_PLACEHOLDER") {
            config.prompt.placeholder = placeholder;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("server port must be greater than 0"));
        }

        if self.audio.bitrate.is_empty() {
            return Err(anyhow!("audio bitrate must not be empty"));
        }

        if !(0.0..=1.0).contains(&self.llm.default_temperature) {
            return Err(anyhow!("default_temperature must be within [0,1]"));
        }

        if self.prompt.placeholder.is_empty() {
            return Err(anyhow!("prompt placeholder must not be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3333,
                bind_address: "0.0.0.0".to_string(),
            },
            audio: AudioConfig {
                bitrate: "20k".to_string(),
                codec: "libmp3lame".to_string(),
                output_media_type: "audio/mpeg".to_string(),
                convert_timeout_seconds: 600,
            },
            transcription: TranscriptionConfig {
                endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
                api_key: None,
                model: "whisper-1".to_string(),
                language: None,
                timeout_seconds: 300,
            },
            llm: LlmConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: None,
                model: "gpt-3.5-turbo-16k".to_string(),
                max_tokens: 4096,
                default_temperature: 0.5,
                timeout_seconds: 120,
            },
            prompt: PromptConfig {
                placeholder: "{transcription}".to_string(),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.config.audio.bitrate = bitrate.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.config.transcription.api_key = Some(key.clone());
        self.config.llm.api_key = Some(key);
        self
    }

    pub fn with_llm_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.llm.endpoint = endpoint.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.config.prompt.placeholder = placeholder.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3333);
        assert_eq!(config.audio.bitrate, "20k");
        assert_eq!(config.prompt.placeholder, "{transcription}");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_port(8080)
            .with_bitrate("32k")
            .with_placeholder("{text}")
            .with_api_key("sk-test")
            .with_llm_endpoint("http://localhost:1234/v1/chat/completions")
            .build();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.audio.bitrate, "32k");
        assert_eq!(config.prompt.placeholder, "{text}");
        // One key feeds both engines
        assert_eq!(config.transcription.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            config.llm.endpoint,
            "http://localhost:1234/v1/chat/completions"
        );
    }

    #[test]
    fn test_search_paths_expand_home() {
        // Every candidate must be directly openable; a literal "~" never is
        for path in Config::search_paths() {
            assert!(!path.to_string_lossy().contains('~'));
        }
    }

    #[test]
    fn test_config_validation_rejects_bad_temperature() {
        let mut config = Config::default();
        config.llm.default_temperature = 1.5;
        assert!(config.validate().is_err());
    }
}
