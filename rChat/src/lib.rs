//! Rust client library for the group and direct messaging chat backend.

pub mod api;
pub mod client;
pub mod conversation;
pub mod error;
pub mod models;
pub mod session;

// Re-export main types
pub use client::{ChatClient, ChatClientBuilder, HttpConfig, Session, SessionHandle};
pub use error::{Error, Result};

// Re-export commonly used models
pub use models::{
    Conversation, ConversationKind, Group, GroupId, Message, MessageId, PageCursor, Role, RoleId,
    Sender, User, UserId,
};

// Re-export API and cache types
pub use api::{HistoryPage, HistoryQuery};
pub use conversation::{
    spawn_live_ingest, ConversationCache, HistorySource, LiveMessage, LoadOutcome, Selection,
};
pub use session::{FileSessionStore, MemorySessionStore, SessionProvider, SessionStore};
