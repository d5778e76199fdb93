//! Session storage and provider trait definitions.

use async_trait::async_trait;

use crate::client::Session;
use crate::error::Result;
use crate::models::UserId;

/// Trait for session persistence backends.
///
/// A stored session survives process restarts; clearing it is part of
/// logging out.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Persist the session, replacing any previous one.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Load the stored session, if any.
    async fn load(&self) -> Result<Option<Session>>;

    /// Forget the stored session.
    async fn clear(&self) -> Result<()>;
}

/// Read-only access to the current session.
pub trait SessionProvider: Send + Sync {
    /// Snapshot of the current session.
    fn session(&self) -> Option<Session>;

    /// Bearer token of the current session.
    fn token(&self) -> Option<String> {
        self.session()
            .map(|s| s.token)
            .filter(|t| !t.trim().is_empty())
    }

    /// ID of the logged-in user.
    fn current_user_id(&self) -> Option<UserId> {
        self.session()
            .map(|s| s.user.id)
            .filter(|id| !id.is_empty())
    }

    /// Display name of the logged-in user.
    fn current_user_name(&self) -> Option<String> {
        self.session()
            .map(|s| s.user.name)
            .filter(|n| !n.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SessionHandle;
    use crate::models::User;

    #[test]
    fn test_provider_defaults() {
        let handle = SessionHandle::default();
        assert_eq!(handle.current_user_id(), None);
        assert_eq!(handle.token(), None);

        handle.set(Session::new(
            "tok",
            User {
                id: "0".into(),
                name: " ".into(),
                ..Default::default()
            },
        ));
        assert_eq!(handle.token(), Some("tok".to_owned()));
        assert_eq!(handle.current_user_id(), None);
        assert_eq!(handle.current_user_name(), None);
    }
}
