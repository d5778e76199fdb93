//! Authentication state management.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{User, UserId};
use crate::session::SessionProvider;

/// A logged-in session: bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token.
    pub token: String,
    /// Logged-in user.
    pub user: User,
}

impl Session {
    /// Create new session.
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Check if the session looks usable.
    pub fn is_valid(&self) -> bool {
        !self.token.trim().is_empty() && !self.user.id.is_empty()
    }

    /// Current user ID.
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// Current user display name.
    pub fn user_name(&self) -> &str {
        &self.user.name
    }
}

/// Shared, swappable holder of the current session.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    /// Create a holder, optionally pre-populated.
    pub fn new(session: Option<Session>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Replace the current session.
    pub fn set(&self, session: Session) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Drop the current session.
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a session is present.
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl SessionProvider for SessionHandle {
    fn session(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
