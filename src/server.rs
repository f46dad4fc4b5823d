use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::summarize::{ChatModel, HttpChatModel, ModelSettings, generate_script};
use crate::transcript::{TranscriptProvider, fetch_transcript};
use crate::youtube::YouTubeCaptions;
use crate::{ScriptError, ShortsScript, Style};

/// State shared by every handler, built once at startup
pub struct AppState {
    pub transcripts: Arc<dyn TranscriptProvider>,
    pub model: Arc<dyn ChatModel>,
    pub settings: ModelSettings,
    pub preferred_lang: String,
    pub fallback_lang: String,
}

impl AppState {
    /// Wire the YouTube caption provider and HTTP chat model from `config`
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self {
            transcripts: Arc::new(YouTubeCaptions::new(client.clone())),
            model: Arc::new(HttpChatModel::new(
                client,
                &config.openai_base_url,
                &config.anthropic_base_url,
            )),
            settings: config.model_settings(),
            preferred_lang: config.preferred_lang.clone(),
            fallback_lang: config.fallback_lang.clone(),
        }
    }
}

#[derive(Deserialize)]
pub struct SummarizeRequest {
    pub video_url: String,
    pub api_key: String,
    #[serde(default)]
    pub style: Style,
}

/// Every failure becomes `{"detail": "..."}`: 400 for invalid input, 500 otherwise
impl IntoResponse for ScriptError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        warn!("Request failed with {status}: {self}");
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/summarize", post(summarize))
        .layer(cors_layer())
        .with_state(state)
}

/// Any origin, method and header with credentials; wildcards are not
/// allowed together with credentials so the request values are mirrored.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "YouTube Shorts script generator",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/summarize": "POST - generate a shorts script from a video URL",
            "/": "GET - service status",
        },
        "available_styles": Style::ALL.iter().map(Style::name).collect::<Vec<_>>(),
        "style_labels": Style::ALL.iter().map(Style::label).collect::<Vec<_>>(),
    }))
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<ShortsScript>, ScriptError> {
    let Json(request) = payload.map_err(|e| ScriptError::InvalidInput(e.body_text()))?;

    if request.api_key.trim().is_empty() {
        return Err(ScriptError::InvalidInput("an LLM API key is required".to_string()));
    }

    let transcript = fetch_transcript(
        state.transcripts.as_ref(),
        &request.video_url,
        &state.preferred_lang,
        &state.fallback_lang,
    )
    .await?;

    let script = generate_script(
        state.model.as_ref(),
        &state.settings,
        &transcript.text,
        &request.api_key,
        request.style,
    )
    .await?;

    info!("Generated {} script for video {}", request.style, transcript.video_id);
    Ok(Json(script))
}
