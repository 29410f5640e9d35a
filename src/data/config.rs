//! Gateway Configuration
//!
//! Handles loading the gateway configuration from TOML plus environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::credential::Credentials;
use crate::session::constants::{IAT_HOST, IAT_PATH, TTS_HOST, TTS_PATH};
use crate::tts::AudioEncoding;

/// Gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub iat: IatConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub asr: AsrConfig,
}

impl GatewayConfig {
    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Load configuration from `path` (or defaults if it does not exist),
    /// then apply credential overrides from the environment
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            GatewayConfig::default()
        };

        config.credentials.apply_env();
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Upstream endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Scheme and authority, e.g. `wss://iat-api.xfyun.cn`
    pub host: String,
    /// Request path, e.g. `/v2/iat`
    pub path: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }
}

/// Speech recognition (IAT) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IatConfig {
    #[serde(default = "default_iat_endpoint")]
    pub endpoint: Endpoint,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_iat_endpoint() -> Endpoint {
    Endpoint::new(IAT_HOST, IAT_PATH)
}

fn default_language() -> String {
    "zh_cn".to_string()
}

impl Default for IatConfig {
    fn default() -> Self {
        Self {
            endpoint: default_iat_endpoint(),
            language: default_language(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: Endpoint,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default)]
    pub encoding: AudioEncoding,
}

fn default_tts_endpoint() -> Endpoint {
    Endpoint::new(TTS_HOST, TTS_PATH)
}

fn default_voice() -> String {
    "xiaoyan".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tts_endpoint(),
            voice: default_voice(),
            encoding: AudioEncoding::default(),
        }
    }
}

/// External transcoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    #[serde(default = "default_program")]
    pub program: PathBuf,
}

fn default_program() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}

/// TLS configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Skip server certificate validation. Logged as a warning when set.
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

/// Per-session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fail a session when no frame arrives within this many seconds.
    /// Unset means wait until the upstream terminates or the caller cancels.
    #[serde(default)]
    pub receive_timeout_secs: Option<u64>,
}

impl SessionConfig {
    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// ASR configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    /// Remove the original upload once a transcription finishes
    #[serde(default = "default_true")]
    pub remove_source: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            remove_source: true,
        }
    }
}
