use serde::Serialize;
use tracing::{instrument, warn};

use crate::bridge::{AiRequest, ResponseBridge};
use crate::extract::extract_json_array;
use crate::fallback::FallbackStore;
use crate::models::{Content, MarketItem, ResponseMode};

const MARKET_PROMPT: &str = "রাজবাড়ী জেলার স্থানীয় বাজারের নিত্যপণ্যের দামের একটি বর্তমান JSON তালিকা দিন। ফিল্ডগুলো হবে: name, unit, priceRange।";
const MARKET_SYSTEM_INSTRUCTION: &str =
    "আপনি রাজবাড়ী জেলা বাজার মনিটরিং অফিসার। শুধু JSON Array দিন।";
/// Notice shown when the reply held no usable price list
pub const UNPARSEABLE_PRICES_NOTICE: &str =
    "লাইভ বাজারদর পড়া যায়নি। সংরক্ষিত তালিকা দেখানো হচ্ছে।";

/// Price list shown on the market screen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    pub items: Vec<MarketItem>,
    pub mode: ResponseMode,
    /// Why the static list is shown instead of live prices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Ask the model for current prices, falling back to the static list
#[instrument(skip_all)]
pub async fn market_prices(
    bridge: &ResponseBridge,
    store: &FallbackStore,
    api_key: Option<&str>,
) -> MarketReport {
    let request = AiRequest::new(vec![Content::prompt(MARKET_PROMPT)])
        .with_system_instruction(MARKET_SYSTEM_INSTRUCTION);

    let notice = match bridge.call(api_key, request).await {
        Ok(response) => match parse_items(&response.text) {
            Some(items) => {
                return MarketReport {
                    items,
                    mode: response.mode,
                    notice: None,
                };
            }
            None => {
                warn!("Market reply is not a JSON price list, serving fallback dataset");
                UNPARSEABLE_PRICES_NOTICE.to_string()
            }
        },
        Err(e) => {
            warn!("Market prices served from fallback dataset: {}", e);
            e.user_message()
        }
    };

    MarketReport {
        items: store.market_items(),
        mode: ResponseMode::OfflineKnowledge,
        notice: Some(notice),
    }
}

/// Parse the model's list, assigning `m-{idx}` ids; all-or-nothing
fn parse_items(text: &str) -> Option<Vec<MarketItem>> {
    let values = extract_json_array(text)?;
    if values.is_empty() {
        return None;
    }
    values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            let mut item: MarketItem = serde_json::from_value(value).ok()?;
            item.id = format!("m-{idx}");
            Some(item)
        })
        .collect()
}
