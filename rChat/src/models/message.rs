//! Chat message models.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{GroupId, MessageId, UserId};

/// Display name given to senders the backend did not describe.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Author reference attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Sender user ID.
    #[serde(rename = "id_usuario", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// Display name.
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
}

impl Sender {
    /// Create a sender reference.
    pub fn new(id: Option<UserId>, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }

    /// Placeholder for messages without a usable sender.
    pub fn unknown() -> Self {
        Self {
            id: None,
            name: Some(UNKNOWN_SENDER.to_owned()),
        }
    }

    /// A sender is usable once it carries a display name.
    pub fn is_valid(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Display name or the placeholder.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => UNKNOWN_SENDER,
        }
    }
}

/// A single chat message.
///
/// Persisted messages carry an id; messages echoed by the realtime
/// transport before persistence may not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireMessage", into = "WireMessage")]
pub struct Message {
    /// Message ID.
    pub id: Option<MessageId>,
    /// Text content.
    pub content: String,
    /// Sender reference.
    pub sender: Option<Sender>,
    /// Author user ID.
    pub author_id: Option<UserId>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Owning group, for group messages.
    pub group_id: Option<GroupId>,
    /// Recipient, for direct messages.
    pub recipient_id: Option<UserId>,
}

impl Message {
    /// Create an unsent message with the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set the message ID.
    pub fn with_id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<UserId>) -> Self {
        self.author_id = Some(author.into());
        self
    }

    /// Set the sender reference.
    pub fn with_sender(mut self, sender: Sender) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set the creation time.
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Whether the sender reference is usable.
    pub fn has_valid_sender(&self) -> bool {
        self.sender.as_ref().is_some_and(Sender::is_valid)
    }

    /// Sender display name or the placeholder.
    pub fn sender_name(&self) -> &str {
        self.sender
            .as_ref()
            .map(Sender::display_name)
            .unwrap_or(UNKNOWN_SENDER)
    }
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 and the `YYYY-MM-DD HH:MM:SS[.fff]` form some endpoints
/// emit, the latter read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Format a timestamp the way the backend stores it.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum WireTimestamp {
    Text(String),
    Millis(i64),
}

impl WireTimestamp {
    fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            WireTimestamp::Text(s) => parse_timestamp(s),
            WireTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
        }
    }
}

/// Message as it travels over the wire.
///
/// The creation time arrives as either `fecha_creacion` or `createdAt`;
/// both are kept here and folded into one field on conversion.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct WireMessage {
    #[serde(rename = "id_mensaje", default, skip_serializing_if = "Option::is_none")]
    id: Option<MessageId>,
    #[serde(rename = "contenido", default)]
    content: Option<String>,
    #[serde(rename = "remitente", default, skip_serializing_if = "Option::is_none")]
    sender: Option<Sender>,
    #[serde(rename = "usuarioIdUsuario", default, skip_serializing_if = "Option::is_none")]
    author_id: Option<UserId>,
    #[serde(rename = "fecha_creacion", default, skip_serializing_if = "Option::is_none")]
    fecha_creacion: Option<WireTimestamp>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    created_at: Option<WireTimestamp>,
    #[serde(rename = "grupoId", default, skip_serializing_if = "Option::is_none")]
    group_id: Option<GroupId>,
    #[serde(rename = "destinatarioId", default, skip_serializing_if = "Option::is_none")]
    recipient_id: Option<UserId>,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        let created_at = wire
            .fecha_creacion
            .as_ref()
            .and_then(WireTimestamp::resolve)
            .or_else(|| wire.created_at.as_ref().and_then(WireTimestamp::resolve));

        Message {
            id: wire.id.filter(|id| !id.is_empty()),
            content: wire.content.unwrap_or_default(),
            sender: wire.sender,
            author_id: wire.author_id,
            created_at,
            group_id: wire.group_id,
            recipient_id: wire.recipient_id,
        }
    }
}

impl From<Message> for WireMessage {
    fn from(msg: Message) -> Self {
        WireMessage {
            id: msg.id,
            content: Some(msg.content),
            sender: msg.sender,
            author_id: msg.author_id,
            fecha_creacion: msg
                .created_at
                .map(|dt| WireTimestamp::Text(format_timestamp(&dt))),
            created_at: None,
            group_id: msg.group_id,
            recipient_id: msg.recipient_id,
        }
    }
}
