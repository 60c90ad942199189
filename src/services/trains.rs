use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::bridge::{AiRequest, ResponseBridge};
use crate::models::{Content, GroundingChunk, Tool, Train};

const TRACKING_SYSTEM_INSTRUCTION: &str =
    "আপনি রাজবাড়ী রেলওয়ে ট্র্যাকিং সহকারী। গুগল সার্চ ব্যবহার করে দ্রুত ও সঠিক তথ্য দিন।";
const NO_RECENT_UPDATE: &str = "দুঃখিত, কোনো সাম্প্রতিক তথ্য পাওয়া যায়নি।";
const UNKNOWN_STATION: &str = "অজানা";

/// Bangladesh Standard Time, UTC+6
const BST_OFFSET_SECS: i32 = 6 * 3600;

/// Best guess of where a train currently is
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainInference {
    pub train_id: String,
    pub current_station: Option<String>,
    pub reason: String,
    pub delay_minutes: u32,
    pub confidence: f32,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    pub sources: Vec<GroundingChunk>,
}

/// Ask the model, with web search, where `train` is right now
#[instrument(skip(bridge, api_key, train), fields(train = %train.id))]
pub async fn locate_train(
    bridge: &ResponseBridge,
    api_key: Option<&str>,
    train: &Train,
    now: DateTime<Utc>,
) -> TrainInference {
    let request = AiRequest::new(vec![Content::user(tracking_prompt(train, now))])
        .with_system_instruction(TRACKING_SYSTEM_INSTRUCTION)
        .with_tools(vec![Tool::google_search()]);

    match bridge.call(api_key, request).await {
        Ok(response) => {
            let text = if response.text.is_empty() {
                NO_RECENT_UPDATE.to_string()
            } else {
                response.text.clone()
            };
            let current_station = parse_station_tag(&text)
                .filter(|found| !found.contains(UNKNOWN_STATION))
                .map(|found| match_route_station(train, &found).unwrap_or(found));
            debug!("Inferred station: {:?}", current_station);

            TrainInference {
                train_id: train.id.clone(),
                current_station,
                reason: strip_station_tag(&text),
                delay_minutes: 0,
                confidence: 0.95,
                is_ai: true,
                sources: response.sources(),
            }
        }
        Err(e) => {
            warn!("Train tracking failed: {}", e);
            TrainInference {
                train_id: train.id.clone(),
                current_station: None,
                reason: format!("দুঃখিত! কানেকশন এরর: {}", e.user_message()),
                delay_minutes: 0,
                confidence: 0.0,
                is_ai: false,
                sources: Vec::new(),
            }
        }
    }
}

fn tracking_prompt(train: &Train, now: DateTime<Utc>) -> String {
    let local = FixedOffset::east_opt(BST_OFFSET_SECS)
        .map_or_else(|| now.naive_utc(), |tz| now.with_timezone(&tz).naive_local());
    format!(
        "এখন সময় {}। রাজবাড়ী জেলার \"{}\" (ট্রেন নং {}) বর্তমানে কোথায় আছে? ফেসবুক গ্রুপ 'Rajbari Rail Club' বা 'Rajbari Helpline' এবং অনলাইন সোর্স থেকে সর্বশেষ ২ ঘণ্টার আপডেট চেক করুন। আপনার উত্তরের শেষে অবশ্যই \"[STATION: স্টেশনের নাম]\" ট্যাগটি যোগ করবেন। যদি সঠিক স্টেশন না পান তবে \"{}\" লিখুন।",
        local.format("%H:%M"),
        train.name,
        train.id,
        UNKNOWN_STATION
    )
}

/// First `[STATION: ...]` tag on a single line, case-insensitive
static STATION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[STATION:\s*(.*?)\]").expect("valid station tag pattern"));

/// Station name inside the tag, trimmed; `None` if there is no tag or it is empty
#[must_use]
pub fn parse_station_tag(text: &str) -> Option<String> {
    let value = STATION_TAG.captures(text)?.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Text with the first station tag removed, trimmed
#[must_use]
pub fn strip_station_tag(text: &str) -> String {
    STATION_TAG.replacen(text, 1, "").trim().to_string()
}

/// First route station that contains, or is contained in, `found`
fn match_route_station(train: &Train, found: &str) -> Option<String> {
    train
        .stations()
        .into_iter()
        .find(|s| found.contains(s) || s.contains(found))
        .map(str::to_string)
}
