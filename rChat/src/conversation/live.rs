//! Ingestion of messages pushed by a realtime transport.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::cache::ConversationCache;
use crate::models::{Conversation, Message};

/// A message delivered out of band, with the conversation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMessage {
    /// Target conversation.
    #[serde(rename = "chatSeleccionado")]
    pub conversation: Conversation,
    /// Payload.
    #[serde(rename = "mensaje")]
    pub message: Message,
}

impl LiveMessage {
    /// Pair a message with its conversation.
    pub fn new(conversation: Conversation, message: Message) -> Self {
        Self {
            conversation,
            message,
        }
    }
}

/// Counters reported when an ingestion task finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Messages appended to the cache.
    pub added: usize,
    /// Messages recognised as duplicates.
    pub duplicates: usize,
    /// Messages rejected as invalid.
    pub rejected: usize,
}

/// Feed every message received on `rx` into the cache.
///
/// The task ends when all senders are dropped. The transport owns the
/// connection; this only consumes what it delivers.
pub fn spawn_live_ingest(
    cache: ConversationCache,
    mut rx: mpsc::Receiver<LiveMessage>,
) -> JoinHandle<IngestStats> {
    tokio::spawn(async move {
        let mut stats = IngestStats::default();

        while let Some(live) = rx.recv().await {
            match cache.add_message(&live.conversation, live.message) {
                Ok(true) => stats.added += 1,
                Ok(false) => stats.duplicates += 1,
                Err(_) => stats.rejected += 1,
            }
        }

        log::debug!("Live ingestion finished: {:?}", stats);
        stats
    })
}
