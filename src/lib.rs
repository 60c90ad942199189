//! `rajbari-ai` - District information assistant for Rajbari
//!
//! This library provides the response bridge onto the Gemini API, best-effort
//! JSON extraction from model replies, the static fallback dataset and the
//! HTTP service built on top of them.

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod gemini;
pub mod models;
pub mod services;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use bridge::{AiRequest, CredentialSource, ResponseBridge};
pub use config::RajbariConfig;
pub use error::BridgeError;
pub use extract::extract_json;
pub use fallback::FallbackStore;
pub use gemini::{GeminiClient, GenerativeBackend};
pub use models::{AiResponse, ChatMessage, ResponseMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, BridgeError>;
