//! Pipeline configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use autocut_media::AudioSettings;

/// Text-generation service settings.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL, without a trailing slash
    pub url: String,
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Total attempts per generate call, including the first
    pub max_attempts: u32,
    /// Backoff base; the delay after failed attempt `n` (0-based) is `base * 2^n`
    pub retry_base_delay: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout: Duration::from_secs(300),
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(1000),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the per-stage artifact folders
    pub output_dir: PathBuf,
    /// Decision log directory
    pub log_dir: PathBuf,
    /// RNNoise model for the `arnndn` filter
    pub denoise_model: PathBuf,
    /// whisper.cpp model
    pub whisper_model: PathBuf,
    /// whisper.cpp executable
    pub whisper_bin: String,
    /// Deadline for each external process
    pub media_timeout: Duration,
    pub audio: AudioSettings,
    pub ollama: OllamaConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            log_dir: PathBuf::from("data/logs"),
            denoise_model: PathBuf::from("models/arnndn/lq.rnnn"),
            whisper_model: PathBuf::from("models/ggml-base.bin"),
            whisper_bin: "whisper-cli".to_string(),
            media_timeout: Duration::from_secs(3600),
            audio: AudioSettings::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let ollama = OllamaConfig {
            url: std::env::var("OLLAMA_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.ollama.url),
            model: std::env::var("OLLAMA_MODEL").unwrap_or(defaults.ollama.model),
            timeout: Duration::from_secs(env_or("OLLAMA_TIMEOUT", 300)),
            max_attempts: env_or("OLLAMA_MAX_RETRIES", 3u32).max(1),
            retry_base_delay: Duration::from_millis(env_or("OLLAMA_RETRY_BASE_MS", 1000)),
        };

        Self {
            output_dir: env_or("DEFAULT_OUTPUT_DIR", defaults.output_dir),
            log_dir: env_or("DEFAULT_LOG_DIR", defaults.log_dir),
            denoise_model: env_or("DEFAULT_MODEL_PATH", defaults.denoise_model),
            whisper_model: env_or("WHISPER_MODEL_PATH", defaults.whisper_model),
            whisper_bin: std::env::var("WHISPER_BIN").unwrap_or(defaults.whisper_bin),
            media_timeout: Duration::from_secs(env_or("MEDIA_TIMEOUT", 3600)),
            audio: AudioSettings {
                sample_rate: env_or("AUDIO_SAMPLE_RATE", defaults.audio.sample_rate),
                channels: env_or("AUDIO_CHANNELS", defaults.audio.channels),
                bitrate: std::env::var("AUDIO_BITRATE").unwrap_or(defaults.audio.bitrate),
            },
            ollama,
        }
    }

    pub fn output_dirs(&self) -> OutputDirs {
        OutputDirs::new(&self.output_dir)
    }
}

/// Fixed per-stage artifact folders under the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    /// Clean audio and the re-muxed denoised video
    pub denoised: PathBuf,
    /// Transcriber output
    pub transcripts: PathBuf,
    /// Cleaned transcripts
    pub edited: PathBuf,
    /// Cut videos
    pub edited_segments: PathBuf,
    /// Timeline documents
    pub timelines: PathBuf,
}

impl OutputDirs {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            denoised: root.join("denoised"),
            transcripts: root.join("transcripts"),
            edited: root.join("edited"),
            edited_segments: root.join("edited_segments"),
            timelines: root.join("timelines"),
        }
    }

    pub fn all(&self) -> [&Path; 5] {
        [
            &self.denoised,
            &self.transcripts,
            &self.edited,
            &self.edited_segments,
            &self.timelines,
        ]
    }

    /// Create every folder that does not exist yet.
    pub async fn create_all(&self) -> std::io::Result<()> {
        for dir in self.all() {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}
