//! History source trait definitions.

use async_trait::async_trait;

use crate::api::{HistoryPage, HistoryQuery};
use crate::client::ChatClient;
use crate::error::Result;

/// Where conversation history pages come from.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetch one page of history.
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryPage>;
}

#[async_trait]
impl HistorySource for ChatClient {
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        self.messages().fetch(query).await
    }
}
