use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::bridge::{AiRequest, ResponseBridge};
use crate::models::{Content, ResponseMode};

pub const PING_PROMPT: &str = "Ping";
pub const PING_SYSTEM_INSTRUCTION: &str = "Respond with 'Vercel Edge Active'";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsStatus {
    Success,
    Error,
}

/// Result of the admin connection test
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    pub status: DiagnosticsStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResponseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    pub latency_ms: u64,
    pub checked_at: DateTime<Utc>,
}

/// Round-trip a tiny prompt through the bridge
#[instrument(skip_all)]
pub async fn run_diagnostics(bridge: &ResponseBridge, api_key: Option<&str>) -> DiagnosticsReport {
    let started = Instant::now();
    let request = AiRequest::new(vec![Content::user(PING_PROMPT)])
        .with_system_instruction(PING_SYSTEM_INSTRUCTION);

    let outcome = bridge.call(api_key, request).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(response) => {
            info!("Diagnostics succeeded in {}ms", latency_ms);
            DiagnosticsReport {
                status: DiagnosticsStatus::Success,
                message: format!("সংযুক্ত হয়েছে! মুড: {}", response.mode),
                mode: Some(response.mode),
                reply: Some(response.text),
                latency_ms,
                checked_at: Utc::now(),
            }
        }
        Err(e) => {
            warn!("Diagnostics failed: {}", e);
            DiagnosticsReport {
                status: DiagnosticsStatus::Error,
                message: e.user_message(),
                mode: None,
                reply: None,
                latency_ms,
                checked_at: Utc::now(),
            }
        }
    }
}
