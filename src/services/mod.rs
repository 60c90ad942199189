//! Screen services
//!
//! Server-side logic behind each screen of the district app: the chat
//! assistant, market prices, live train tracking, the map explorer and the
//! admin connection test. Each service makes at most one bridge call and
//! decides how to fall back when it fails.

pub mod chat;
pub mod diagnostics;
pub mod map;
pub mod market;
pub mod trains;

pub use chat::Conversation;
pub use diagnostics::{DiagnosticsReport, DiagnosticsStatus, run_diagnostics};
pub use map::{PlaceSearch, search_places};
pub use market::{MarketReport, market_prices};
pub use trains::{TrainInference, locate_train};
