//! Configuration management for arcade-tts.
//!
//! Loads config from YAML files in standard locations, then applies the
//! environment overrides the service has always honored (`VOICE_REFERENCE`,
//! `OUTPUT_FOLDER`, `PORT`, `HOST`, `TTS_BACKEND_URL`).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("tag set must contain at least one tag")]
    EmptyTagSet,

    #[error("min_tags ({min}) is greater than max_tags ({max})")]
    TagRange { min: usize, max: usize },

    #[error("failed to create output folder {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Audio sample the model clones.
    pub reference: PathBuf,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            reference: PathBuf::from("voices/default_voice.wav"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub folder: PathBuf,
    pub file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("tts_output"),
            file_name: "latest_tts.wav".into(),
        }
    }
}

impl OutputConfig {
    /// The single WAV path every request overwrites.
    pub fn output_file(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    pub tags: Vec<String>,
    pub min_tags: usize,
    pub max_tags: usize,
    /// Fixed RNG seed for reproducible injection. Random when unset.
    pub seed: Option<u64>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            tags: vec![
                "[sigh]".into(),
                "[laugh]".into(),
                "[chuckle]".into(),
                "[cough]".into(),
            ],
            min_tags: 1,
            max_tags: 3,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend_url: String,
    pub device: String,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000".into(),
            device: "cuda".into(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub voice: VoiceConfig,
    pub output: OutputConfig,
    pub tags: TagConfig,
    pub model: ModelConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/arcade-tts/config.yaml
    /// 3. /etc/arcade-tts/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/arcade-tts/config.yaml")),
                Some(PathBuf::from("/etc/arcade-tts/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::from_yaml(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(reference) = lookup("VOICE_REFERENCE") {
            self.voice.reference = PathBuf::from(reference);
        }
        if let Some(folder) = lookup("OUTPUT_FOLDER") {
            self.output.folder = PathBuf::from(folder);
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!("Ignoring PORT={port:?}: {e}"),
            }
        }
        if let Some(url) = lookup("TTS_BACKEND_URL") {
            self.model.backend_url = url;
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }
}
