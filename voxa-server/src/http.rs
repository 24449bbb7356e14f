// HTTP API for the chat widget: knowledge, chat, voice, speech, embed, dashboard

use crate::settings::VoxaConfig;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use voxa_core::Error as CoreError;
use voxa_kb::{
    FileDescriptor, FilePolicy, FileRejection, ItemId, KnowledgeItem, KnowledgeStats,
    KnowledgeStore, QueryResult,
};
use voxa_sc::{ChannelRecognizer, RecognizerFeed, SpeechRecognizer, UnavailableRecognizer};
use voxa_spk::config::validate_voice_id;
use voxa_spk::{SpeechSynthesizer, Voice, MAX_TEXT_CHARS};
use voxa_widget::{
    embed, render_loader_script, ChatError, ChatSession, ChatState, Dashboard, DashboardSnapshot,
    EmbedFormat, EmbedOptions, Exchange, LoaderConfig, LoaderOptions, SettingsForm, Turn,
    WidgetConfig,
};

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<KnowledgeStore>,
    pub file_policy: Arc<FilePolicy>,
    pub synthesizer: Option<Arc<SpeechSynthesizer>>,
    pub chat: Arc<Mutex<ChatSession>>,
    pub voice_feed: Option<RecognizerFeed>,
    pub dashboard: Arc<Dashboard>,
    pub settings: Arc<RwLock<SettingsForm>>,
    pub widget_host: Arc<str>,
    pub auto_open_delay_ms: u64,
}

impl AppState {
    /// Build state from configuration. Speech synthesis stays off when the
    /// section is disabled or no API key is available.
    pub fn from_config(config: &VoxaConfig) -> Self {
        let synthesizer = if config.speech.enabled {
            match SpeechSynthesizer::new(config.speech.clone()) {
                Ok(synth) => Some(Arc::new(synth)),
                Err(e) => {
                    warn!(error = %e, "Speech synthesis disabled");
                    None
                }
            }
        } else {
            info!("Speech synthesis disabled by configuration");
            None
        };
        Self::build(config, synthesizer)
    }

    pub fn build(config: &VoxaConfig, synthesizer: Option<Arc<SpeechSynthesizer>>) -> Self {
        let store = Arc::new(config.knowledge.build_store());

        let (recognizer, voice_feed): (Arc<dyn SpeechRecognizer>, Option<RecognizerFeed>) =
            if config.server.voice_input {
                let recognizer = ChannelRecognizer::new();
                let feed = recognizer.feed();
                (Arc::new(recognizer), Some(feed))
            } else {
                (Arc::new(UnavailableRecognizer), None)
            };

        let mut chat = ChatSession::new(Arc::clone(&store))
            .with_recognizer(recognizer)
            .with_config(config.chat.clone())
            .with_capture_config(config.capture.clone());
        if let Some(synth) = &synthesizer {
            chat = chat.with_speaker(synth.clone());
        }

        let mut settings = SettingsForm::from_widget(config.widget.clone());
        settings.voice_id = config.speech.voice.voice_id.clone();

        Self {
            file_policy: Arc::new(config.knowledge.policy()),
            dashboard: Arc::new(Dashboard::new(Arc::clone(&store))),
            store,
            synthesizer,
            chat: Arc::new(Mutex::new(chat)),
            voice_feed,
            settings: Arc::new(RwLock::new(settings)),
            widget_host: Arc::from(config.server.widget_host.as_str()),
            auto_open_delay_ms: config.server.auto_open_delay_ms,
        }
    }

    fn synthesizer(&self) -> Result<&Arc<SpeechSynthesizer>, ApiError> {
        self.synthesizer.as_ref().ok_or_else(|| {
            ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "SYNTHESIS_ERROR",
                "Speech synthesis is not configured",
            )
        })
    }

    /// The chat session, or 409 while another exchange holds it.
    fn chat(&self) -> Result<tokio::sync::MutexGuard<'_, ChatSession>, ApiError> {
        self.chat
            .try_lock()
            .map_err(|_| ApiError::conflict("Chat is busy"))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Error mapped onto a status code and `{error, code}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::Synthesis(_) => StatusCode::BAD_GATEWAY,
            CoreError::Capture(_) => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::Query(_)
            | CoreError::Configuration(_)
            | CoreError::Serialization(_)
            | CoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(code = err.code(), error = %err, "Request failed");
        }
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Busy(_) | ChatError::NotListening => Self::conflict(err.to_string()),
            ChatError::Capture(e) => CoreError::from(e).into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
            code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn create_router(state: AppState) -> Router {
    let knowledge = Router::new()
        .route("/api/v1/knowledge", get(list_knowledge).delete(clear_knowledge))
        .route("/api/v1/knowledge/stats", get(knowledge_stats))
        .route("/api/v1/knowledge/files", post(add_files))
        .route("/api/v1/knowledge/urls", post(add_urls))
        .route("/api/v1/knowledge/query", post(query_knowledge))
        .route("/api/v1/knowledge/:id", delete(remove_knowledge));

    let chat = Router::new()
        .route("/api/v1/chat/messages", post(send_message))
        .route("/api/v1/chat/transcript", get(get_transcript))
        .route("/api/v1/chat/voice/start", post(start_voice))
        .route("/api/v1/chat/voice/interim", post(voice_result))
        .route("/api/v1/chat/voice/stop", post(stop_voice))
        .route("/api/v1/chat/voice/cancel", post(cancel_voice));

    let widget = Router::new()
        .route("/api/v1/speech", post(synthesize_speech))
        .route("/api/v1/speech/voices", get(list_voices))
        .route("/api/v1/embed/:format", post(embed_code))
        .route("/widget-loader.js", get(loader_script))
        .route("/api/v1/dashboard", get(dashboard_snapshot))
        .route(
            "/api/v1/dashboard/settings",
            get(get_settings).put(update_settings),
        );

    Router::new()
        .route("/health", get(health_handler))
        .merge(knowledge)
        .merge(chat)
        .merge(widget)
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found_handler() -> ApiError {
    ApiError::not_found("Route not found")
}

// Knowledge

async fn list_knowledge(State(state): State<AppState>) -> Json<Vec<KnowledgeItem>> {
    Json(state.store.list().collect())
}

async fn knowledge_stats(State(state): State<AppState>) -> Json<KnowledgeStats> {
    Json(state.store.stats())
}

#[derive(Debug, Deserialize)]
struct AddFilesRequest {
    files: Vec<FileDescriptor>,
}

#[derive(Debug, Serialize)]
struct AddFilesResponse {
    added: Vec<KnowledgeItem>,
    rejected: Vec<FileRejection>,
}

async fn add_files(
    State(state): State<AppState>,
    Json(request): Json<AddFilesRequest>,
) -> Json<AddFilesResponse> {
    let (accepted, rejected) = state.file_policy.partition(request.files);
    for rejection in &rejected {
        info!(file = %rejection.file.name, reason = %rejection.message, "File rejected");
    }
    let added = state.store.add_files(accepted);
    Json(AddFilesResponse { added, rejected })
}

#[derive(Debug, Deserialize)]
struct AddUrlsRequest {
    urls: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AddUrlsResponse {
    added: Vec<KnowledgeItem>,
}

async fn add_urls(
    State(state): State<AppState>,
    Json(request): Json<AddUrlsRequest>,
) -> ApiResult<Json<AddUrlsResponse>> {
    let added = state
        .store
        .add_urls(request.urls)
        .map_err(CoreError::from)?;
    Ok(Json(AddUrlsResponse { added }))
}

async fn remove_knowledge(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.dashboard.remove_item(&ItemId::from(id));
    StatusCode::NO_CONTENT
}

async fn clear_knowledge(State(state): State<AppState>) -> StatusCode {
    state.dashboard.clear();
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
}

async fn query_knowledge(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<Json<QueryResult>> {
    let result = state.store.query(&request.query).map_err(CoreError::from)?;
    Ok(Json(result))
}

// Chat

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeBody {
    user: Turn,
    assistant: Turn,
    /// base64 `audio/mpeg`
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<String>,
}

impl From<Exchange> for ExchangeBody {
    fn from(exchange: Exchange) -> Self {
        Self {
            user: exchange.user,
            assistant: exchange.assistant,
            audio: exchange.audio.map(|bytes| BASE64.encode(bytes)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeResponse {
    exchange: Option<ExchangeBody>,
    state: ChatState,
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    text: String,
}

async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<Json<ExchangeResponse>> {
    let mut chat = state.chat()?;
    let exchange = chat.send(&request.text).await?;
    Ok(Json(ExchangeResponse {
        exchange: exchange.map(ExchangeBody::from),
        state: chat.state(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptResponse {
    turns: Vec<Turn>,
    state: ChatState,
    voice_supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    live_transcript: Option<String>,
}

async fn get_transcript(State(state): State<AppState>) -> ApiResult<Json<TranscriptResponse>> {
    let chat = state.chat()?;
    Ok(Json(TranscriptResponse {
        turns: chat.transcript().turns().to_vec(),
        state: chat.state(),
        voice_supported: chat.voice_supported(),
        live_transcript: chat.live_transcript(),
    }))
}

#[derive(Debug, Serialize)]
struct StateResponse {
    state: ChatState,
}

async fn start_voice(State(state): State<AppState>) -> ApiResult<Json<StateResponse>> {
    let mut chat = state.chat()?;
    chat.start_voice().await?;
    Ok(Json(StateResponse {
        state: chat.state(),
    }))
}

#[derive(Debug, Deserialize)]
struct VoiceResultRequest {
    text: String,
    #[serde(default, rename = "final")]
    is_final: bool,
}

async fn voice_result(
    State(state): State<AppState>,
    Json(request): Json<VoiceResultRequest>,
) -> ApiResult<StatusCode> {
    let feed = state.voice_feed.as_ref().ok_or_else(|| {
        ApiError::from(CoreError::Capture("Voice input is not enabled".to_string()))
    })?;

    let sent = if request.is_final {
        feed.final_text(request.text)
    } else {
        feed.interim(request.text)
    };
    sent.map_err(|e| ApiError::from(ChatError::Capture(e)))?;
    Ok(StatusCode::ACCEPTED)
}

async fn stop_voice(State(state): State<AppState>) -> ApiResult<Json<ExchangeResponse>> {
    let mut chat = state.chat()?;
    let exchange = chat.stop_voice().await?;
    Ok(Json(ExchangeResponse {
        exchange: exchange.map(ExchangeBody::from),
        state: chat.state(),
    }))
}

async fn cancel_voice(State(state): State<AppState>) -> ApiResult<Json<StateResponse>> {
    let mut chat = state.chat()?;
    chat.cancel_voice()?;
    Ok(Json(StateResponse {
        state: chat.state(),
    }))
}

// Speech

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeechRequest {
    text: String,
    voice_id: Option<String>,
}

async fn synthesize_speech(
    State(state): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> ApiResult<Response> {
    if request.text.trim().is_empty() {
        return Err(ApiError::validation("Text cannot be empty"));
    }
    if request.text.chars().count() > MAX_TEXT_CHARS {
        return Err(ApiError::validation(format!(
            "Text too long (max {} characters)",
            MAX_TEXT_CHARS
        )));
    }
    if let Some(voice_id) = &request.voice_id {
        validate_voice_id(voice_id).map_err(ApiError::validation)?;
    }

    let synth = state.synthesizer()?;
    let audio = match &request.voice_id {
        Some(voice_id) => synth.speak_with_voice(&request.text, voice_id).await,
        None => synth.speak(&request.text).await,
    }
    .map_err(CoreError::from)?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

async fn list_voices(State(state): State<AppState>) -> ApiResult<Json<Vec<Voice>>> {
    let voices = state.synthesizer()?.voices().await.map_err(CoreError::from)?;
    Ok(Json(voices))
}

// Embed + loader

async fn embed_code(
    State(state): State<AppState>,
    Path(format): Path<String>,
    Json(config): Json<WidgetConfig>,
) -> ApiResult<Response> {
    let format: EmbedFormat = format.parse().map_err(ApiError::not_found)?;
    config.validate().map_err(ApiError::validation)?;

    let options = EmbedOptions::for_host(&state.widget_host);
    let snippet = embed::generate_with(format, &config, &options);
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], snippet).into_response())
}

async fn loader_script(State(state): State<AppState>) -> ApiResult<Response> {
    let widget = state.settings.read().widget.clone();
    let options = LoaderOptions {
        widget_host: state.widget_host.to_string(),
        auto_open_delay_ms: state.auto_open_delay_ms,
        defaults: LoaderConfig::from_widget(&widget),
    };
    let script = render_loader_script(&options)?;
    Ok(([(header::CONTENT_TYPE, "application/javascript")], script).into_response())
}

// Dashboard

async fn dashboard_snapshot(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.current())
}

async fn get_settings(State(state): State<AppState>) -> Json<SettingsForm> {
    Json(state.settings.read().clone())
}

async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<serde_json::Value>,
) -> ApiResult<Json<SettingsForm>> {
    let mut settings = state.settings.write();
    settings.update(patch)?;
    Ok(Json(settings.clone()))
}
