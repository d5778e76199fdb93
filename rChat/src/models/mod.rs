//! Data models for chat entities.

mod conversation;
mod ids;
mod message;
mod user;

pub use conversation::{Conversation, ConversationKind, PageCursor};
pub use ids::{GroupId, MessageId, RoleId, UserId};
pub use message::{format_timestamp, parse_timestamp, Message, Sender, UNKNOWN_SENDER};
pub use user::{Group, Role, User};
