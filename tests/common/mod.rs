use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use rajbari_ai::api::{self, AppState};
use rajbari_ai::config::GeminiConfig;
use rajbari_ai::gemini::{
    BackendError, GenerateContentRequest, GenerateContentResponse, GenerativeBackend,
};
use rajbari_ai::{CredentialSource, FallbackStore};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Backend replaying one canned outcome and counting calls
pub struct ScriptedBackend {
    outcome: Result<GenerateContentResponse, BackendError>,
    pub requests: Mutex<Vec<GenerateContentRequest>>,
}

impl ScriptedBackend {
    pub fn replying(text: &str) -> Arc<Self> {
        Self::with_outcome(Ok(GenerateContentResponse::from_text(text)))
    }

    pub fn with_outcome(outcome: Result<GenerateContentResponse, BackendError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate_content(
        &self,
        _api_key: &str,
        _model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone()
    }
}

pub fn app(backend: Arc<ScriptedBackend>, api_key: Option<&str>) -> Router {
    let state = AppState::new(
        backend,
        Arc::new(FallbackStore::embedded().unwrap()),
        CredentialSource::Fixed(api_key.map(str::to_string)),
        &GeminiConfig::default(),
    );
    Router::new().nest("/api", api::router(state))
}

pub async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
