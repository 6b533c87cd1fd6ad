//! HTTP API for arcade-tts.
//!
//! - `GET|POST /speak`     inject random tags, synthesize, save
//! - `GET|POST /speak_raw` synthesize the text as given
//! - `GET /health`
//!
//! Text comes from the `text` query parameter on GET and the `text` field of
//! a JSON body on POST.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::audio::AudioError;
use crate::synth::{SynthError, Synthesizer};
use crate::tags::TagInjector;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No text provided")]
    NoText,

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NoText => StatusCode::BAD_REQUEST,
            Self::Synth(_) | Self::Audio(_) => {
                error!("Error: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub synthesizer: Arc<dyn Synthesizer>,
    pub injector: Arc<TagInjector>,
    pub rng: Arc<Mutex<StdRng>>,
    pub voice_reference: PathBuf,
    pub output_file: PathBuf,
    /// Held across synthesis and file write; there is only one output file.
    synth_lock: Arc<AsyncMutex<()>>,
}

impl AppState {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        injector: TagInjector,
        rng: StdRng,
        voice_reference: PathBuf,
        output_file: &Path,
    ) -> Self {
        let output_file =
            std::path::absolute(output_file).unwrap_or_else(|_| output_file.to_path_buf());

        Self {
            synthesizer,
            injector: Arc::new(injector),
            rng: Arc::new(Mutex::new(rng)),
            voice_reference,
            output_file,
            synth_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    fn inject_tags(&self, text: &str) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.injector.inject(text, &mut *rng)
    }

    /// Synthesize `text` and overwrite the output file with the result.
    async fn render(&self, text: &str) -> Result<(), ApiError> {
        let _guard = self.synth_lock.lock().await;

        let wave = self
            .synthesizer
            .synthesize(text, &self.voice_reference)
            .await?;
        wave.save(&self.output_file)?;

        info!("Saved to {}", self.output_file.display());
        Ok(())
    }
}

// --- Request/Response types ---

#[derive(Debug, Default, Deserialize)]
struct TextParams {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpeakResponse {
    pub success: bool,
    pub original_text: String,
    pub tagged_text: String,
    pub output_file: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpeakRawResponse {
    pub success: bool,
    pub text: String,
    pub output_file: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub voice_reference: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/speak", get(handle_speak_query).post(handle_speak_body))
        .route(
            "/speak_raw",
            get(handle_speak_raw_query).post(handle_speak_raw_body),
        )
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until the listener fails.
pub async fn serve(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("TTS server listening on http://{addr}");
    axum::serve(listener, router(state)).await
}

/// A missing or malformed JSON body reads as empty text.
fn text_from_body(body: &[u8]) -> String {
    serde_json::from_slice::<TextParams>(body)
        .map(|p| p.text)
        .unwrap_or_default()
}

// --- Handlers ---

async fn handle_speak_query(
    State(state): State<AppState>,
    Query(params): Query<TextParams>,
) -> Result<Json<SpeakResponse>, ApiError> {
    speak(state, params.text).await
}

async fn handle_speak_body(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SpeakResponse>, ApiError> {
    speak(state, text_from_body(&body)).await
}

async fn handle_speak_raw_query(
    State(state): State<AppState>,
    Query(params): Query<TextParams>,
) -> Result<Json<SpeakRawResponse>, ApiError> {
    speak_raw(state, params.text).await
}

async fn handle_speak_raw_body(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SpeakRawResponse>, ApiError> {
    speak_raw(state, text_from_body(&body)).await
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        model_loaded: state.synthesizer.ready().await,
        voice_reference: state.voice_reference.clone(),
    })
}

async fn speak(state: AppState, text: String) -> Result<Json<SpeakResponse>, ApiError> {
    if text.is_empty() {
        return Err(ApiError::NoText);
    }

    let tagged_text = state.inject_tags(&text);
    info!("Original: {text}");
    info!("Tagged: {tagged_text}");

    state.render(&tagged_text).await?;

    Ok(Json(SpeakResponse {
        success: true,
        original_text: text,
        tagged_text,
        output_file: state.output_file.clone(),
    }))
}

async fn speak_raw(state: AppState, text: String) -> Result<Json<SpeakRawResponse>, ApiError> {
    if text.is_empty() {
        return Err(ApiError::NoText);
    }

    info!("Raw text (no tags): {text}");
    state.render(&text).await?;

    Ok(Json(SpeakRawResponse {
        success: true,
        text,
        output_file: state.output_file.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_text_extraction() {
        assert_eq!(text_from_body(br#"{"text": "hi there"}"#), "hi there");
        assert_eq!(text_from_body(br#"{"other": 1}"#), "");
        assert_eq!(text_from_body(br#"{"text": null}"#), "");
        assert_eq!(text_from_body(b""), "");
        assert_eq!(text_from_body(b"not json"), "");
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            ApiError::NoText.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        let backend = ApiError::Synth(SynthError::Backend {
            status: 503,
            message: "warming up".into(),
        });
        assert_eq!(
            backend.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
