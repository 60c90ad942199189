use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::bridge::{AiRequest, ResponseBridge};
use crate::error::BridgeError;
use crate::extract::extract_json_array;
use crate::models::{Content, GroundingChunk, Place, ResponseMode, Tool};

/// Places found by the model for a free-text map query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSearch {
    pub query: String,
    pub places: Vec<Place>,
    pub sources: Vec<GroundingChunk>,
    pub mode: ResponseMode,
}

fn place_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "lat": { "type": "NUMBER" },
                "lng": { "type": "NUMBER" },
                "category": {
                    "type": "STRING",
                    "description": "Category of the place: hotel, restaurant, landmark, hospital, police, other"
                }
            },
            "required": ["name", "lat", "lng", "category"]
        }
    })
}

/// Locate `query` inside the district using web search and a JSON schema
#[instrument(skip(bridge, api_key))]
pub async fn search_places(
    bridge: &ResponseBridge,
    api_key: Option<&str>,
    query: &str,
) -> Result<PlaceSearch, BridgeError> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Err(BridgeError::validation("খোঁজার জন্য কিছু লিখুন।"));
    }

    let prompt = format!(
        "Find precisely the coordinates of \"{query}\" in Rajbari District, Bangladesh. Use Google Search to find exact latitude and longitude."
    );
    let request = AiRequest::new(vec![Content::prompt(prompt)])
        .with_tools(vec![Tool::google_search()])
        .with_json_schema(place_schema());

    let response = bridge.call(api_key, request).await?;
    let places = parse_places(&response.text);
    info!("Map search '{}' returned {} place(s)", query, places.len());

    Ok(PlaceSearch {
        sources: response.sources(),
        mode: response.mode,
        query,
        places,
    })
}

/// Entries that do not fit the place shape are skipped
fn parse_places(text: &str) -> Vec<Place> {
    extract_json_array(text)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| serde_json::from_value::<Place>(value).ok())
        .enumerate()
        .map(|(idx, place)| Place {
            id: format!("ai-{idx}"),
            is_ai: true,
            ..place
        })
        .collect()
}
