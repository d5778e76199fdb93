//! Message API.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    client::ChatClientInner,
    error::{Error, Result},
    models::{Conversation, ConversationKind, Message, PageCursor, Sender, UserId},
    session::SessionProvider,
};

/// Default history page size.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// API for message operations.
pub struct MessageApi {
    client: Arc<ChatClientInner>,
}

impl MessageApi {
    pub(crate) fn new(client: Arc<ChatClientInner>) -> Self {
        Self { client }
    }

    /// Get a page of a conversation's history.
    pub fn history(&self, conversation: Conversation) -> HistoryBuilder {
        HistoryBuilder {
            client: self.client.clone(),
            conversation,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            unread_only: false,
        }
    }

    /// Execute a prepared history query.
    pub async fn fetch(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        let params = query.params()?;
        let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let data = self
            .client
            .get_authed("mensajes/obtenerMensajes", &params)
            .await?;

        parse_history(data, query.page)
    }

    /// Send a message to a conversation.
    pub fn send(&self, conversation: Conversation) -> SendMessageBuilder {
        SendMessageBuilder {
            client: self.client.clone(),
            conversation,
            content: String::new(),
        }
    }
}

/// Parameters of a history request.
///
/// Direct conversations are scoped by both participants, so they carry
/// the current user's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Conversation to read.
    pub conversation: Conversation,
    /// Page number, starting at 1.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Only unread messages.
    pub unread_only: bool,
    /// Current user, required for direct conversations.
    pub me: Option<UserId>,
}

impl HistoryQuery {
    /// Build a validated query.
    pub fn new(
        conversation: Conversation,
        page: u32,
        limit: u32,
        unread_only: bool,
        me: Option<UserId>,
    ) -> Result<Self> {
        conversation.validate()?;

        let me = me.filter(|id| !id.is_empty());
        if conversation.kind == ConversationKind::Direct && me.is_none() {
            return Err(Error::IdentityUnavailable(format!(
                "cannot read direct conversation with {} without a logged-in user",
                conversation.id
            )));
        }

        Ok(Self {
            conversation,
            page: page.max(1),
            limit: limit.max(1),
            unread_only,
            me,
        })
    }

    /// Query string parameters.
    pub fn params(&self) -> Result<Vec<(&'static str, String)>> {
        let mut params = vec![
            ("pagina", self.page.to_string()),
            ("limite", self.limit.to_string()),
            ("tipoChat", self.conversation.kind.as_param().to_owned()),
        ];

        if self.unread_only {
            params.push(("noLeidos", "true".to_owned()));
        }

        match self.conversation.kind {
            ConversationKind::Group => {
                params.push(("grupoId", self.conversation.id.clone()));
            }
            ConversationKind::Direct => {
                let me = self.me.as_ref().ok_or_else(|| {
                    Error::IdentityUnavailable("direct conversation query without user".into())
                })?;
                params.push(("usuarioId", self.conversation.id.clone()));
                params.push(("miId", me.to_string()));
            }
        }

        Ok(params)
    }
}

/// One page of conversation history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    /// Messages as returned by the server.
    pub messages: Vec<Message>,
    /// Pagination state.
    pub cursor: PageCursor,
}

/// Builder for history requests.
pub struct HistoryBuilder {
    client: Arc<ChatClientInner>,
    conversation: Conversation,
    page: u32,
    limit: u32,
    unread_only: bool,
}

impl HistoryBuilder {
    /// Set the page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Only fetch unread messages.
    pub fn unread_only(mut self, unread_only: bool) -> Self {
        self.unread_only = unread_only;
        self
    }

    /// Execute the request.
    pub async fn send(self) -> Result<HistoryPage> {
        let query = HistoryQuery::new(
            self.conversation,
            self.page,
            self.limit,
            self.unread_only,
            self.client.session.current_user_id(),
        )?;

        MessageApi::new(self.client).fetch(&query).await
    }
}

/// Builder for sending messages.
pub struct SendMessageBuilder {
    client: Arc<ChatClientInner>,
    conversation: Conversation,
    content: String,
}

impl SendMessageBuilder {
    /// Set the message content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Persist the message.
    ///
    /// The message is stamped with the current time so a realtime echo of
    /// it can be matched against the persisted copy. Returns the stored
    /// message when the server echoes it, otherwise the stamped one.
    pub async fn send(self) -> Result<Message> {
        self.conversation.validate()?;

        if self.content.trim().is_empty() {
            return Err(Error::invalid("Message content cannot be empty"));
        }

        let session = self.client.session.session().ok_or(Error::AuthRequired)?;

        let mut message = Message::new(self.content)
            .with_author(session.user.id.clone())
            .with_sender(Sender::new(
                Some(session.user.id.clone()),
                session.user.name.clone(),
            ))
            .at(Utc::now());

        match self.conversation.kind {
            ConversationKind::Group => message.group_id = self.conversation.group_id(),
            ConversationKind::Direct => message.recipient_id = self.conversation.other_user_id(),
        }

        let data = self
            .client
            .post_json_authed("mensajes/crearMensaje", &message)
            .await?;

        Ok(merge_created(message, data))
    }
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    #[serde(rename = "mensajes", default)]
    messages: Vec<Message>,
    #[serde(flatten)]
    cursor: PageCursor,
}

fn parse_history(data: Value, requested_page: u32) -> Result<HistoryPage> {
    if data.is_null() {
        return Err(Error::missing("data"));
    }

    let mut parsed: HistoryData =
        serde_json::from_value(data).map_err(|e| Error::parse(e.to_string()))?;

    if parsed.cursor.page == 0 {
        parsed.cursor.page = requested_page;
    }

    Ok(HistoryPage {
        messages: parsed.messages,
        cursor: parsed.cursor,
    })
}

/// Take the server's copy of a created message when it sends one back.
fn merge_created(sent: Message, data: Value) -> Message {
    let echoed = data.get("mensaje").cloned().unwrap_or(data);

    match as_message(echoed) {
        Some(mut stored) if stored.id.is_some() => {
            if stored.content.is_empty() {
                stored.content = sent.content.clone();
            }
            stored.author_id = stored.author_id.or(sent.author_id);
            stored.sender = stored.sender.filter(Sender::is_valid).or(sent.sender);
            stored.created_at = stored.created_at.or(sent.created_at);
            stored.group_id = stored.group_id.or(sent.group_id);
            stored.recipient_id = stored.recipient_id.or(sent.recipient_id);
            stored
        }
        _ => sent,
    }
}

fn as_message(value: Value) -> Option<Message> {
    if value.is_object() {
        serde_json::from_value(value).ok()
    } else {
        None
    }
}
