//! Conversation descriptors and pagination state.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{GroupId, UserId};
use crate::error::{Error, Result};

/// Kind of conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationKind {
    /// Group chat.
    #[serde(rename = "grupo")]
    Group,
    /// One-to-one chat with another user.
    #[serde(rename = "directo")]
    Direct,
}

impl ConversationKind {
    /// Discriminator sent as `tipoChat`.
    pub fn as_param(&self) -> &'static str {
        match self {
            ConversationKind::Group => "grupo",
            ConversationKind::Direct => "directo",
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Identity of a conversation.
///
/// For direct conversations `id` is the other participant; the current
/// user is implied by the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conversation {
    /// Group or direct.
    #[serde(rename = "tipo")]
    pub kind: ConversationKind,
    /// Group id or other user id.
    pub id: String,
}

impl Conversation {
    /// Create a descriptor.
    pub fn new(kind: ConversationKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// A group conversation.
    pub fn group(id: impl Into<GroupId>) -> Self {
        Self::new(ConversationKind::Group, id.into().0)
    }

    /// A direct conversation with another user.
    pub fn direct(other: impl Into<UserId>) -> Self {
        Self::new(ConversationKind::Direct, other.into().0)
    }

    /// Check that the descriptor names a conversation.
    pub fn validate(&self) -> Result<()> {
        let id = self.id.trim();
        if id.is_empty() || id == "0" {
            return Err(Error::invalid(format!(
                "conversation {} has no id",
                self.kind
            )));
        }
        Ok(())
    }

    /// Whether this is a group conversation.
    pub fn is_group(&self) -> bool {
        self.kind == ConversationKind::Group
    }

    /// Group id, if this is a group conversation.
    pub fn group_id(&self) -> Option<GroupId> {
        self.is_group().then(|| GroupId::new(self.id.clone()))
    }

    /// The other participant, if this is a direct conversation.
    pub fn other_user_id(&self) -> Option<UserId> {
        (!self.is_group()).then(|| UserId::new(self.id.clone()))
    }
}

impl fmt::Display for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Pagination state of a conversation's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Total messages on the server.
    #[serde(default)]
    pub total: u64,
    /// Page last fetched.
    #[serde(rename = "pagina", default)]
    pub page: u32,
    /// Total pages.
    #[serde(rename = "totalPaginas", default)]
    pub total_pages: u32,
}

impl PageCursor {
    /// Whether older pages remain after the current one.
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Conversation::group("3").validate().is_ok());
        assert!(Conversation::direct("9").validate().is_ok());
        assert!(Conversation::group("").validate().is_err());
        assert!(Conversation::direct("0").validate().is_err());
    }

    #[test]
    fn test_kind_scoped_identity() {
        let group = Conversation::group("5");
        let direct = Conversation::direct("5");
        assert_ne!(group, direct);
        assert_eq!(group.group_id(), Some(GroupId::new("5")));
        assert_eq!(group.other_user_id(), None);
        assert_eq!(direct.other_user_id(), Some(UserId::new("5")));
    }

    #[test]
    fn test_descriptor_wire_format() {
        let conv: Conversation = serde_json::from_str(r#"{"tipo":"directo","id":"4"}"#).unwrap();
        assert_eq!(conv, Conversation::direct("4"));
    }

    #[test]
    fn test_cursor_has_more() {
        let cursor = PageCursor {
            total: 120,
            page: 1,
            total_pages: 3,
        };
        assert!(cursor.has_more());
        assert!(!PageCursor::default().has_more());
    }
}
