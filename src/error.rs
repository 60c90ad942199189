//! Error types and handling for the Rajbari AI service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Shown for permission failures (HTTP 403 from the AI endpoint).
pub const MSG_FORBIDDEN: &str = "এপিআই কী (API Key) অবৈধ বা পারমিশন নেই।";
/// Shown for quota failures (HTTP 429 from the AI endpoint).
pub const MSG_RATE_LIMITED: &str = "অতিরিক্ত রিকোয়েস্ট পাঠানো হয়েছে। কিছুক্ষণ পর চেষ্টা করুন।";
/// Shown when the AI endpoint rejects the key itself.
pub const MSG_INVALID_API_KEY: &str = "API Key টি সঠিক নয়। দয়া করে সেটিংস চেক করুন।";
/// Shown for every other gateway failure.
pub const MSG_GATEWAY: &str = "এআই সার্ভারে সমস্যা হয়েছে।";

/// Main error type for the Rajbari AI service
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The AI credential is absent; no network call was attempted
    #[error("API key missing: {var} is not set")]
    MissingApiKey { var: String },

    /// The AI endpoint refused the request (403-like)
    #[error("AI endpoint forbidden: {raw}")]
    Forbidden { raw: String },

    /// The AI endpoint rate-limited the request (429-like)
    #[error("AI endpoint rate limited: {raw}")]
    RateLimited { raw: String },

    /// The AI endpoint rejected the API key
    #[error("AI endpoint rejected API key: {raw}")]
    InvalidApiKey { raw: String },

    /// Any other AI gateway failure
    #[error("AI gateway error: {raw}")]
    Gateway { raw: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Requested record does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BridgeError {
    /// Classify a raw AI endpoint failure message.
    ///
    /// Rate limiting wins over permission errors when both markers appear.
    pub fn from_gateway_message<S: Into<String>>(raw: S) -> Self {
        let raw = raw.into();
        if raw.contains("429") {
            Self::RateLimited { raw }
        } else if raw.contains("403") {
            Self::Forbidden { raw }
        } else if raw.contains("API_KEY_INVALID") {
            Self::InvalidApiKey { raw }
        } else {
            Self::Gateway { raw }
        }
    }

    /// The credential held in environment variable `var` is absent
    pub fn missing_api_key<S: Into<String>>(var: S) -> Self {
        Self::MissingApiKey { var: var.into() }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used as the `error` field of HTTP bodies
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::MissingApiKey { .. } => "API_KEY_MISSING",
            BridgeError::Forbidden { .. }
            | BridgeError::RateLimited { .. }
            | BridgeError::InvalidApiKey { .. }
            | BridgeError::Gateway { .. } => "AI_GATEWAY_ERROR",
            BridgeError::Validation { .. } => "INVALID_REQUEST",
            BridgeError::NotFound { .. } => "NOT_FOUND",
            BridgeError::Config { .. } => "CONFIG_ERROR",
            BridgeError::Io { .. } => "IO_ERROR",
        }
    }

    /// Get a user-facing (Bengali) error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BridgeError::MissingApiKey { var } => {
                format!("\"{var}\" সেট করা নেই। সেটিংস > এনভায়রনমেন্ট ভেরিয়েবল চেক করুন।")
            }
            BridgeError::Forbidden { .. } => MSG_FORBIDDEN.to_string(),
            BridgeError::RateLimited { .. } => MSG_RATE_LIMITED.to_string(),
            BridgeError::InvalidApiKey { .. } => MSG_INVALID_API_KEY.to_string(),
            BridgeError::Gateway { .. } => MSG_GATEWAY.to_string(),
            BridgeError::Validation { message } | BridgeError::NotFound { message } => {
                message.clone()
            }
            BridgeError::Config { .. } => "সার্ভার কনফিগারেশনে সমস্যা হয়েছে।".to_string(),
            BridgeError::Io { .. } => "ফাইল পড়তে সমস্যা হয়েছে।".to_string(),
        }
    }

    /// The underlying message as reported by the failing component, if any
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        match self {
            BridgeError::MissingApiKey { .. } => None,
            BridgeError::Forbidden { raw }
            | BridgeError::RateLimited { raw }
            | BridgeError::InvalidApiKey { raw }
            | BridgeError::Gateway { raw } => Some(raw.clone()),
            BridgeError::Validation { message }
            | BridgeError::NotFound { message }
            | BridgeError::Config { message } => Some(message.clone()),
            BridgeError::Io { source } => Some(source.to_string()),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            BridgeError::Validation { .. } => StatusCode::BAD_REQUEST,
            BridgeError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl From<&BridgeError> for ErrorBody {
    fn from(err: &BridgeError) -> Self {
        Self {
            error: err.code().to_string(),
            details: err.user_message(),
            raw: err.raw(),
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}
