//! Conversation cache: merges paginated history with live messages.

mod cache;
mod dedup;
mod live;
mod source;

pub use cache::{ConversationCache, LoadOutcome, Selection};
pub(crate) use cache::WeakConversationCache;
pub use dedup::{is_exact_duplicate, is_live_duplicate, normalize_history, LIVE_DUPLICATE_WINDOW_MS};
pub use live::{spawn_live_ingest, IngestStats, LiveMessage};
pub use source::HistorySource;
