//! Response bridge
//!
//! One request to the generative-AI endpoint per call, normalized into an
//! [`AiResponse`]. The in-process path used by the screen services and the
//! public `/api/ai` gateway share this implementation and differ only in
//! their [`ResponseMode`] defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::GeminiConfig;
use crate::error::BridgeError;
use crate::gemini::{GenerateContentRequest, GenerationConfig, GenerativeBackend, SystemInstruction};
use crate::models::{AiResponse, Content, ResponseMode, Tool};

/// Placeholder the gateway answers with when the model returns no text.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "দুঃখিত, কোনো তথ্য খুঁজে পাওয়া যায়নি।";

const CLIENT_SYSTEM_INSTRUCTION: &str = "আপনি রাজবাড়ী জেলার একজন ডিজিটাল সহকারী।";
const GATEWAY_SYSTEM_INSTRUCTION: &str =
    "আপনি রাজবাড়ী জেলার একজন ডিজিটাল সহকারী। গুগল সার্চ ব্যবহার করে সব সময় লেটেস্ট তথ্য দিন।";

/// A request to the bridge, as accepted by `POST /api/ai`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// `None` means "use web search"; an explicit empty list disables tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl AiRequest {
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            ..Self::default()
        }
    }

    pub fn with_system_instruction<S: Into<String>>(mut self, instruction: S) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_json_schema(mut self, schema: Value) -> Self {
        self.response_mime_type = Some("application/json".to_string());
        self.response_schema = Some(schema);
        self
    }
}

/// Where the AI credential comes from.
///
/// Read at call time so a key rotated in the environment is picked up
/// without a restart.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Named process environment variable
    Env(String),
    /// Fixed value, `None` meaning "not configured"
    Fixed(Option<String>),
}

impl CredentialSource {
    #[must_use]
    pub fn read(&self) -> Option<String> {
        match self {
            CredentialSource::Env(name) => std::env::var(name).ok(),
            CredentialSource::Fixed(value) => value.clone(),
        }
        .filter(|key| !key.trim().is_empty())
    }
}

/// Normalizing wrapper around a [`GenerativeBackend`]
#[derive(Clone)]
pub struct ResponseBridge {
    backend: Arc<dyn GenerativeBackend>,
    mode: ResponseMode,
    default_model: String,
    temperature: f32,
    api_key_env: String,
}

impl ResponseBridge {
    pub fn new(backend: Arc<dyn GenerativeBackend>, mode: ResponseMode, config: &GeminiConfig) -> Self {
        Self {
            backend,
            mode,
            default_model: config.default_model.clone(),
            temperature: config.temperature,
            api_key_env: config.api_key_env.clone(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// Error for an absent credential, naming the configured variable
    #[must_use]
    pub fn missing_api_key(&self) -> BridgeError {
        BridgeError::missing_api_key(&self.api_key_env)
    }

    fn default_system_instruction(&self) -> &'static str {
        match self.mode {
            ResponseMode::LiveCloud => GATEWAY_SYSTEM_INSTRUCTION,
            ResponseMode::ClientDirect | ResponseMode::OfflineKnowledge => {
                CLIENT_SYSTEM_INSTRUCTION
            }
        }
    }

    /// Text substituted for an empty model reply, if this path has one
    fn empty_reply_placeholder(&self) -> Option<&'static str> {
        match self.mode {
            ResponseMode::LiveCloud => Some(EMPTY_REPLY_PLACEHOLDER),
            ResponseMode::ClientDirect | ResponseMode::OfflineKnowledge => None,
        }
    }

    /// Build the wire request with every default applied
    #[must_use]
    pub fn build_request(&self, request: AiRequest) -> (String, GenerateContentRequest) {
        let model = request
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.default_model.clone());
        let instruction = request
            .system_instruction
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.default_system_instruction().to_string());
        let tools = request.tools.unwrap_or_else(|| vec![Tool::google_search()]);

        let wire = GenerateContentRequest {
            contents: request.contents,
            system_instruction: Some(SystemInstruction::text(instruction)),
            tools,
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: request.response_mime_type,
                response_schema: request.response_schema,
            },
        };
        (model, wire)
    }

    /// Issue exactly one call to the AI endpoint.
    ///
    /// A missing credential fails before the backend is touched.
    #[instrument(skip(self, api_key, request), fields(mode = %self.mode))]
    pub async fn call(
        &self,
        api_key: Option<&str>,
        request: AiRequest,
    ) -> Result<AiResponse, BridgeError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                warn!("AI call rejected: {} is not configured", self.api_key_env);
                self.missing_api_key()
            })?;

        let (model, wire) = self.build_request(request);
        debug!("Sending {} turn(s) to {}", wire.contents.len(), model);

        match self.backend.generate_content(api_key, &model, &wire).await {
            Ok(response) => {
                let mut text = response.text();
                if text.is_empty() {
                    if let Some(placeholder) = self.empty_reply_placeholder() {
                        text = placeholder.to_string();
                    }
                }
                info!("AI call succeeded ({} chars)", text.chars().count());
                Ok(AiResponse {
                    text,
                    grounding_metadata: response.grounding_metadata(),
                    mode: self.mode,
                })
            }
            Err(e) => {
                let raw = e.to_string();
                error!("AI bridge error: {}", raw);
                Err(BridgeError::from_gateway_message(raw))
            }
        }
    }
}
