//! HTTP API
//!
//! `POST /api/ai` is the public gateway onto the response bridge; the other
//! routes serve the data each screen of the district app needs.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use crate::{
    VERSION,
    bridge::{AiRequest, CredentialSource, ResponseBridge},
    config::GeminiConfig,
    error::BridgeError,
    fallback::FallbackStore,
    gemini::GenerativeBackend,
    models::{AiResponse, ChatMessage, Place, PlaceCategory, Record, ResponseMode, Train},
    services::{
        self, Conversation, DiagnosticsReport, MarketReport, PlaceSearch, TrainInference,
    },
};

/// Shared, read-only handler state
#[derive(Clone)]
pub struct AppState {
    /// Bridge behind the public gateway route
    pub gateway: Arc<ResponseBridge>,
    /// Bridge used by the screen services
    pub direct: Arc<ResponseBridge>,
    pub store: Arc<FallbackStore>,
    pub credentials: CredentialSource,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        store: Arc<FallbackStore>,
        credentials: CredentialSource,
        config: &GeminiConfig,
    ) -> Self {
        Self {
            gateway: Arc::new(ResponseBridge::new(
                backend.clone(),
                ResponseMode::LiveCloud,
                config,
            )),
            direct: Arc::new(ResponseBridge::new(
                backend,
                ResponseMode::ClientDirect,
                config,
            )),
            store,
            credentials,
        }
    }

    /// The credential as configured right now
    fn api_key(&self) -> Option<String> {
        self.credentials.read()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ai", post(ai_bridge).fallback(method_not_allowed))
        .route("/chat", post(chat))
        .route("/chat/reset", post(reset_chat))
        .route("/categories", get(list_categories))
        .route("/categories/{key}", get(get_category))
        .route("/market", get(market))
        .route("/trains", get(list_trains))
        .route("/trains/{id}/locate", post(locate_train))
        .route("/places", get(list_places))
        .route("/places/search", post(search_places))
        .route("/diagnostics", get(diagnostics))
        .with_state(state)
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, BridgeError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| BridgeError::validation(rejection.body_text()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method Not Allowed" })),
    )
}

#[instrument(skip_all)]
async fn ai_bridge(
    State(state): State<AppState>,
    payload: Result<Json<AiRequest>, JsonRejection>,
) -> Result<Json<AiResponse>, BridgeError> {
    let api_key = state
        .api_key()
        .ok_or_else(|| state.gateway.missing_api_key())?;
    let request = parse_body(payload)?;
    let response = state.gateway.call(Some(&api_key), request).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    history: Vec<ChatMessage>,
    #[serde(default)]
    message: String,
    /// Resend the last user message instead of `message`
    #[serde(default)]
    retry: bool,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: ChatMessage,
    history: Vec<ChatMessage>,
}

#[instrument(skip_all)]
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, BridgeError> {
    let request = parse_body(payload)?;
    let api_key = state.api_key();
    let mut conversation = Conversation::from_history(request.history);

    let reply = if request.retry {
        conversation.retry(&state.direct, api_key.as_deref()).await
    } else {
        conversation
            .ask(&state.direct, api_key.as_deref(), &request.message)
            .await
    }
    .cloned()
    .ok_or_else(|| BridgeError::validation("প্রশ্ন লিখুন।"))?;

    Ok(Json(ChatResponse {
        reply,
        history: conversation.into_messages(),
    }))
}

#[derive(Debug, Serialize)]
struct ChatHistory {
    history: Vec<ChatMessage>,
}

async fn reset_chat() -> Json<ChatHistory> {
    let mut conversation = Conversation::new();
    conversation.reset();
    Json(ChatHistory {
        history: conversation.into_messages(),
    })
}

async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(
        state
            .store
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect(),
    )
}

async fn get_category(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<Vec<Record>> {
    Json(state.store.category(&key).to_vec())
}

async fn market(State(state): State<AppState>) -> Json<MarketReport> {
    let api_key = state.api_key();
    Json(services::market_prices(&state.direct, &state.store, api_key.as_deref()).await)
}

async fn list_trains(State(state): State<AppState>) -> Json<Vec<Train>> {
    Json(state.store.trains().into_iter().cloned().collect())
}

async fn locate_train(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TrainInference>, BridgeError> {
    let train = state
        .store
        .train(&id)
        .cloned()
        .ok_or_else(|| BridgeError::not_found(format!("ট্রেন নং {id} পাওয়া যায়নি।")))?;
    let api_key = state.api_key();
    Ok(Json(
        services::locate_train(&state.direct, api_key.as_deref(), &train, Utc::now()).await,
    ))
}

#[derive(Debug, Deserialize)]
struct PlacesQuery {
    category: Option<PlaceCategory>,
}

async fn list_places(
    State(state): State<AppState>,
    Query(query): Query<PlacesQuery>,
) -> Json<Vec<Place>> {
    Json(state.store.places(query.category))
}

#[derive(Debug, Deserialize)]
struct PlaceSearchRequest {
    query: String,
}

async fn search_places(
    State(state): State<AppState>,
    payload: Result<Json<PlaceSearchRequest>, JsonRejection>,
) -> Result<Json<PlaceSearch>, BridgeError> {
    let request = parse_body(payload)?;
    let api_key = state.api_key();
    Ok(Json(
        services::search_places(&state.direct, api_key.as_deref(), &request.query).await?,
    ))
}

async fn diagnostics(State(state): State<AppState>) -> Json<DiagnosticsReport> {
    let api_key = state.api_key();
    Json(services::run_diagnostics(&state.direct, api_key.as_deref()).await)
}
