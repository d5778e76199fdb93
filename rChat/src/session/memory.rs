//! In-memory session store.

use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};

use super::traits::SessionStore;
use crate::client::Session;
use crate::error::Result;

/// Session store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    data: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: &Session) -> Result<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *data = Some(session.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<Session>> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.clone())
    }

    async fn clear(&self) -> Result<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *data = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn session() -> Session {
        Session::new(
            "token",
            User {
                id: "4".into(),
                name: "Luis".into(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_basic_operations() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&session()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session()));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
