use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::fs::read_to_string;

use crate::wav::WavParams;

/// Chat-completion API settings (OpenRouter-compatible)
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LlmConfig {
    /// API key, falls back to the OPENROUTER_API_KEY environment variable
    pub api_key: Option<String>,

    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            api_key: None,
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
        }
    }
}

/// What to do when speech synthesis is unavailable for a listen request
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Report the error and stay idle
    #[default]
    None,

    /// Speak through the live synthesis backend instead
    Live,
}

/// Speech-synthesis API settings (Gemini TTS compatible)
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TtsConfig {
    /// API key, falls back to the GEMINI_API_KEY environment variable
    pub api_key: Option<String>,

    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_tts_model")]
    pub model: String,

    /// Voice used for single-voice note narration
    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_speaker1_voice")]
    pub speaker1_voice: String,

    #[serde(default = "default_speaker2_voice")]
    pub speaker2_voice: String,

    /// PCM format the speech API returns
    #[serde(default)]
    pub wav: WavParams,

    #[serde(default)]
    pub fallback: FallbackPolicy,
}

impl Default for TtsConfig {
    fn default() -> Self {
        TtsConfig {
            api_key: None,
            endpoint: default_tts_endpoint(),
            model: default_tts_model(),
            voice: default_voice(),
            speaker1_voice: default_speaker1_voice(),
            speaker2_voice: default_speaker2_voice(),
            wav: WavParams::default(),
            fallback: FallbackPolicy::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_notebooks_file")]
    pub notebooks_file: String,

    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            notebooks_file: default_notebooks_file(),
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StreamConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            listen_addr: default_listen_addr(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub tts: TtsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub stream: StreamConfig,
}

fn default_llm_endpoint() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_llm_model() -> String {
    "openrouter/auto".to_string()
}

fn default_tts_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_voice() -> String {
    "Kore".to_string()
}

fn default_speaker1_voice() -> String {
    "Kore".to_string()
}

fn default_speaker2_voice() -> String {
    "Puck".to_string()
}

fn default_notebooks_file() -> String {
    "notebooks.json".to_string()
}

fn default_artifacts_dir() -> String {
    "artifacts".to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:7878".to_string()
}

pub async fn load() -> Result<Config> {
    let config = read_to_string("Config.toml").await;

    let mut config: Config = match config {
        Ok(config) => toml::from_str(&config)?,
        Err(e) => {
            info!("Could not read Config.toml ({e}), using defaults");
            Config::default()
        }
    };

    // Environment variables win over missing config keys
    if config.llm.api_key.is_none() {
        config.llm.api_key = std::env::var("OPENROUTER_API_KEY").ok();
    }
    if config.tts.api_key.is_none() {
        config.tts.api_key = std::env::var("GEMINI_API_KEY").ok();
    }

    Ok(config)
}
