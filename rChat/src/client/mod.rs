//! HTTP client and configuration.

mod auth;
mod http;

pub use auth::{Session, SessionHandle};
pub use http::{Envelope, HttpConfig, DEFAULT_BASE_URL};

use crate::api::{AuthApi, GroupApi, MessageApi, RoleApi, UserApi};
use crate::conversation::{ConversationCache, WeakConversationCache};
use crate::error::{Error, Result};
use crate::session::{SessionProvider, SessionStore};
use http::{build_client, HttpExecutor};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Builder for creating ChatClient.
pub struct ChatClientBuilder {
    session: Option<Session>,
    http_config: HttpConfig,
    store: Option<Arc<dyn SessionStore>>,
}

impl std::fmt::Debug for ChatClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClientBuilder")
            .field("session", &self.session.as_ref().map(|s| &s.user.id))
            .field("http_config", &self.http_config)
            .field("store", &self.store)
            .finish()
    }
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            session: None,
            http_config: HttpConfig::default(),
            store: None,
        }
    }

    /// Start with an existing session.
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Set base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.http_config.base_url = url.into();
        self
    }

    /// Set custom user agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.http_config.custom_user_agent = Some(ua.into());
        self
    }

    /// Set connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.connect_timeout = timeout;
        self
    }

    /// Set read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.read_timeout = timeout;
        self
    }

    /// Set the store sessions are persisted to.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build ChatClient.
    pub fn build(self) -> Result<ChatClient> {
        let http_client = build_client(&self.http_config)?;

        Ok(ChatClient {
            inner: Arc::new(ChatClientInner {
                http: http_client,
                config: self.http_config,
                session: SessionHandle::new(self.session),
                store: self.store,
                caches: Mutex::new(Vec::new()),
            }),
        })
    }
}

/// Internal client state.
pub(crate) struct ChatClientInner {
    pub http: reqwest::Client,
    pub config: HttpConfig,
    pub session: SessionHandle,
    pub store: Option<Arc<dyn SessionStore>>,
    /// Caches handed out by `conversation_cache`, reset on logout.
    pub caches: Mutex<Vec<WeakConversationCache>>,
}

impl ChatClientInner {
    /// Get the bearer token or error.
    pub fn require_token(&self) -> Result<String> {
        self.session.token().ok_or(Error::AuthRequired)
    }

    /// Create HTTP executor.
    pub fn executor(&self) -> HttpExecutor<'_> {
        HttpExecutor::new(&self.http, &self.config)
    }

    /// Execute an authenticated GET request.
    pub async fn get_authed(&self, api: &str, query: &[(&str, &str)]) -> Result<Value> {
        let token = self.require_token()?;
        self.executor().get(api, query, Some(&token)).await
    }

    /// Execute a GET request without credentials.
    pub async fn get(&self, api: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.executor().get(api, query, None).await
    }

    /// Execute an authenticated JSON POST request.
    pub async fn post_json_authed<B: Serialize + ?Sized + Sync>(
        &self,
        api: &str,
        body: &B,
    ) -> Result<Value> {
        let token = self.require_token()?;
        self.executor()
            .post_json(api, body, Some(&token))
            .await?
            .into_result()
    }

    /// Install a session and persist it.
    pub async fn install_session(&self, session: Session) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(&session).await?;
        }
        self.session.set(session);
        Ok(())
    }
}

/// Chat client for interacting with the backend.
#[derive(Clone)]
pub struct ChatClient {
    pub(crate) inner: Arc<ChatClientInner>,
}

impl ChatClient {
    /// Create a new client builder.
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::new()
    }

    /// Get the authentication API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.inner.clone())
    }

    /// Get the group API.
    pub fn groups(&self) -> GroupApi {
        GroupApi::new(self.inner.clone())
    }

    /// Get the user API.
    pub fn users(&self) -> UserApi {
        UserApi::new(self.inner.clone())
    }

    /// Get the role API.
    pub fn roles(&self) -> RoleApi {
        RoleApi::new(self.inner.clone())
    }

    /// Get the message API.
    pub fn messages(&self) -> MessageApi {
        MessageApi::new(self.inner.clone())
    }

    /// Create a conversation cache fed by this client.
    ///
    /// The cache is emptied when this client logs out.
    pub fn conversation_cache(&self) -> ConversationCache {
        let client = Arc::new(self.clone());
        let cache = ConversationCache::new(client.clone(), client);

        let mut caches = self
            .inner
            .caches
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        caches.retain(|weak| weak.upgrade().is_some());
        caches.push(cache.downgrade());

        cache
    }

    /// Check if the client has a session.
    pub fn is_authenticated(&self) -> bool {
        self.inner.session.is_authenticated()
    }

    /// Shared session holder.
    pub fn session_handle(&self) -> &SessionHandle {
        &self.inner.session
    }

    /// Reload the session from the configured store.
    ///
    /// Returns whether a usable session was found. Stored sessions that
    /// fail validation are cleared.
    pub async fn restore_session(&self) -> Result<bool> {
        let Some(store) = &self.inner.store else {
            return Ok(false);
        };

        match store.load().await? {
            Some(session) if session.is_valid() => {
                log::debug!("Restored session for user {}", session.user.id);
                self.inner.session.set(session);
                Ok(true)
            }
            Some(_) => {
                log::warn!("Stored session is incomplete, clearing it");
                store.clear().await?;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// End the session and forget it in the store.
    ///
    /// Every cache created by [`ChatClient::conversation_cache`] is reset,
    /// and loads still in flight for them are discarded.
    pub async fn logout(&self) -> Result<()> {
        self.inner.session.clear();

        let caches: Vec<ConversationCache> = self
            .inner
            .caches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .filter_map(|weak| weak.upgrade())
            .collect();
        for cache in caches {
            cache.reset();
        }

        if let Some(store) = &self.inner.store {
            store.clear().await?;
        }
        log::debug!("Session closed");
        Ok(())
    }
}

impl SessionProvider for ChatClient {
    fn session(&self) -> Option<Session> {
        self.inner.session.session()
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("authenticated", &self.is_authenticated())
            .field("base_url", &self.inner.config.base_url)
            .finish()
    }
}
