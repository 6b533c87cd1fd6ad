//! Voice-cloning synthesis backend.
//!
//! The model itself runs out of process. `HttpSynthesizer` posts the text and
//! the voice reference path to the backend's `/generate` endpoint and decodes
//! the WAV it answers with.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audio::{AudioError, Waveform};
use crate::config::ModelConfig;

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("model backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error(transparent)]
    Audio(#[from] AudioError),
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render `text` in the voice of `voice_reference`.
    async fn synthesize(&self, text: &str, voice_reference: &Path) -> Result<Waveform, SynthError>;

    /// Whether the model is loaded and answering.
    async fn ready(&self) -> bool;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
    audio_prompt_path: &'a Path,
    device: &'a str,
}

pub struct HttpSynthesizer {
    base_url: String,
    device: String,
    client: Client,
}

impl HttpSynthesizer {
    pub fn new(config: &ModelConfig) -> Result<Self, SynthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            device: config.device.clone(),
            client,
        })
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, voice_reference: &Path) -> Result<Waveform, SynthError> {
        let t0 = Instant::now();
        let url = format!("{}/generate", self.base_url);
        let body = GenerateRequest {
            text,
            audio_prompt_path: voice_reference,
            device: &self.device,
        };

        debug!("POST {url} ({} chars)", text.len());
        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!("Model backend returned status {status}");
            return Err(SynthError::Backend {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let bytes = resp.bytes().await?;
        let wave = Waveform::from_wav_bytes(&bytes)?;

        info!(
            "Generated {:.1}s of audio in {:.0}ms",
            wave.duration_secs(),
            t0.elapsed().as_secs_f64() * 1000.0
        );
        Ok(wave)
    }

    async fn ready(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                if e.is_connect() {
                    warn!("Cannot connect to model backend at {}", self.base_url);
                } else {
                    warn!("Model backend health check failed: {e}");
                }
                false
            }
        }
    }
}
