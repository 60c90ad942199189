//! Shared data types: conversation turns, AI responses and district records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A text fragment of a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One ordered conversation turn as sent to the AI endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: Some(Role::User),
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn model<S: Into<String>>(text: S) -> Self {
        Self {
            role: Some(Role::Model),
            parts: vec![Part { text: text.into() }],
        }
    }

    /// A turn without an explicit role; the endpoint treats it as user input.
    pub fn prompt<S: Into<String>>(text: S) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Tool declarations the model may use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    GoogleSearch(GoogleSearch),
}

impl Tool {
    pub fn google_search() -> Self {
        Tool::GoogleSearch(GoogleSearch {})
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleSearch {}

/// Web reference of a citation chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebReference {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A single citation returned with a grounded answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebReference>,
}

/// Citation information describing which web sources informed an answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_search_queries: Vec<String>,
}

/// Which code path produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseMode {
    /// In-process call made on behalf of a screen
    #[serde(rename = "client_direct_v3")]
    ClientDirect,
    /// The public `/api/ai` gateway
    #[serde(rename = "live_cloud_v2")]
    LiveCloud,
    /// Answer served from the static fallback dataset
    #[serde(rename = "offline_knowledge")]
    OfflineKnowledge,
}

impl ResponseMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::ClientDirect => "client_direct_v3",
            ResponseMode::LiveCloud => "live_cloud_v2",
            ResponseMode::OfflineKnowledge => "offline_knowledge",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized result of one AI call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    pub text: String,
    pub grounding_metadata: Option<GroundingMetadata>,
    pub mode: ResponseMode,
}

impl AiResponse {
    /// Citation chunks, empty when the answer was not grounded
    #[must_use]
    pub fn sources(&self) -> Vec<GroundingChunk> {
        self.grounding_metadata
            .as_ref()
            .map(|m| m.grounding_chunks.clone())
            .unwrap_or_default()
    }
}

/// A rendered chat bubble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<GroundingChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResponseMode>,
}

impl ChatMessage {
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            is_error: false,
            sources: Vec::new(),
            mode: None,
        }
    }

    pub fn model<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            is_error: false,
            sources: Vec::new(),
            mode: None,
        }
    }

    pub fn error<S: Into<String>>(text: S) -> Self {
        Self {
            is_error: true,
            ..Self::model(text)
        }
    }

    /// Convert into a turn for the AI endpoint
    #[must_use]
    pub fn to_content(&self) -> Content {
        Content {
            role: Some(self.role),
            parts: vec![Part {
                text: self.text.clone(),
            }],
        }
    }
}

/// Kind of a map marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceCategory {
    Hospital,
    Police,
    Emergency,
    Hotel,
    Restaurant,
    Landmark,
    #[serde(other)]
    Other,
}

/// A point of interest on the district map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub category: PlaceCategory,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "isAI")]
    pub is_ai: bool,
}

/// A scheduled train serving the district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    pub id: String,
    pub name: String,
    pub route: String,
    pub departure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_day: Option<String>,
    /// Comma-separated station list in travel order
    pub detailed_route: String,
}

impl Train {
    /// Station names of the detailed route, trimmed, in order
    #[must_use]
    pub fn stations(&self) -> Vec<&str> {
        self.detailed_route
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// A commodity price line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub unit: String,
    pub price_range: String,
}

/// A directory entry (hospital, police station, office, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Any record the fallback store can hand out
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Train(Train),
    Market(MarketItem),
    Place(Place),
    Listing(Listing),
}

impl Record {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Record::Train(t) => &t.id,
            Record::Market(m) => &m.id,
            Record::Place(p) => &p.id,
            Record::Listing(l) => &l.id,
        }
    }
}
