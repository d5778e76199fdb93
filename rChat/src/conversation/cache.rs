//! Per-conversation message cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::task::JoinHandle;

use super::dedup::{is_live_duplicate, normalize_history};
use super::source::HistorySource;
use crate::api::{HistoryQuery, DEFAULT_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::models::{Conversation, Message, PageCursor, Sender, UNKNOWN_SENDER};
use crate::session::SessionProvider;

/// Outcome of [`ConversationCache::select_conversation`].
#[derive(Debug)]
pub enum Selection {
    /// The conversation was already active; nothing was fetched.
    Unchanged,
    /// The conversation became active and its first history page is loading.
    ///
    /// Dropping the handle does not cancel the load.
    Loading(JoinHandle<Result<LoadOutcome>>),
}

/// Outcome of a history load that reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page replaced the cached list; `messages` is the new length.
    Applied { messages: usize },
    /// A newer load finished first, or the cache was reset; the page was
    /// discarded.
    Stale,
}

/// Identifies one history request against its conversation slot.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    epoch: u64,
    number: u64,
    live_mark: u64,
}

#[derive(Debug, Default)]
struct Slot {
    messages: Vec<Message>,
    cursor: Option<PageCursor>,
    /// Last ticket number handed out.
    issued: u64,
    /// Ticket number of the last applied page.
    applied: u64,
    in_flight: u32,
    /// Live messages accepted so far.
    live_seq: u64,
    /// Live messages accepted while a load was in flight, by sequence.
    live_log: Vec<(u64, Message)>,
}

#[derive(Debug, Default)]
struct CacheState {
    epoch: u64,
    active: Option<Conversation>,
    slots: HashMap<Conversation, Slot>,
}

struct CacheInner {
    state: Mutex<CacheState>,
    history: Arc<dyn HistorySource>,
    session: Arc<dyn SessionProvider>,
}

/// In-memory message lists keyed by conversation.
///
/// History pages replace a conversation's list; live messages are appended
/// after a duplicate check. A page that arrives after live messages were
/// accepted keeps those messages, and a page overtaken by a newer request
/// for the same conversation is dropped.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct ConversationCache {
    inner: Arc<CacheInner>,
}

/// Non-owning reference to a cache, used to reach it on logout.
#[derive(Clone)]
pub(crate) struct WeakConversationCache(Weak<CacheInner>);

impl WeakConversationCache {
    pub(crate) fn upgrade(&self) -> Option<ConversationCache> {
        self.0.upgrade().map(|inner| ConversationCache { inner })
    }
}

impl std::fmt::Debug for ConversationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ConversationCache")
            .field("active", &state.active)
            .field("conversations", &state.slots.len())
            .finish()
    }
}

impl ConversationCache {
    /// Create an empty cache.
    pub fn new(history: Arc<dyn HistorySource>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState::default()),
                history,
                session,
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakConversationCache {
        WeakConversationCache(Arc::downgrade(&self.inner))
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `conversation` the active one and start loading its history.
    ///
    /// Re-selecting the active conversation is a no-op. Must be called from
    /// within a Tokio runtime.
    pub fn select_conversation(&self, conversation: &Conversation) -> Result<Selection> {
        if let Err(e) = conversation.validate() {
            log::error!("Cannot select conversation: {}", e);
            return Err(e);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Internal(format!("no async runtime to load history: {e}")))?;

        {
            let mut state = self.state();
            if state.active.as_ref() == Some(conversation) {
                log::debug!("Conversation {} already selected", conversation);
                return Ok(Selection::Unchanged);
            }
            state.active = Some(conversation.clone());
        }
        log::debug!("Selected conversation {}", conversation);

        let cache = self.clone();
        let conversation = conversation.clone();
        let handle = runtime.spawn(async move {
            cache
                .load_history(&conversation, 1, DEFAULT_PAGE_SIZE, false)
                .await
        });

        Ok(Selection::Loading(handle))
    }

    /// Fetch a page of history and make it the conversation's list.
    ///
    /// On failure the cached list and cursor are left as they were.
    pub async fn load_history(
        &self,
        conversation: &Conversation,
        page: u32,
        page_size: u32,
        unread_only: bool,
    ) -> Result<LoadOutcome> {
        let query = HistoryQuery::new(
            conversation.clone(),
            page,
            page_size,
            unread_only,
            self.inner.session.current_user_id(),
        )
        .inspect_err(|e| log::error!("Cannot load messages for {}: {}", conversation, e))?;

        let ticket = self.issue_ticket(conversation);
        log::debug!("Requesting {:?}", query);

        let fetched = self.inner.history.fetch_history(&query).await;

        let mut state = self.state();
        if ticket.epoch != state.epoch {
            // The cache was reset meanwhile; its slots must stay gone.
            return match fetched {
                Ok(_) => {
                    log::debug!("Discarding history page for {} after reset", conversation);
                    Ok(LoadOutcome::Stale)
                }
                Err(e) => {
                    log::error!("Failed to load messages for {}: {}", conversation, e);
                    Err(e)
                }
            };
        }

        let slot = state.slots.entry(conversation.clone()).or_default();
        slot.in_flight = slot.in_flight.saturating_sub(1);

        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                release_live_log(slot);
                log::error!("Failed to load messages for {}: {}", conversation, e);
                return Err(e);
            }
        };

        if ticket.number < slot.applied {
            log::debug!("Discarding stale history page for {}", conversation);
            release_live_log(slot);
            return Ok(LoadOutcome::Stale);
        }

        let mut messages = normalize_history(page.messages);
        for (seq, live) in &slot.live_log {
            if *seq >= ticket.live_mark && !messages.iter().any(|m| is_live_duplicate(m, live)) {
                messages.push(live.clone());
            }
        }

        log::debug!(
            "Loaded {} messages for {} (page {}/{})",
            messages.len(),
            conversation,
            page.cursor.page,
            page.cursor.total_pages
        );

        let count = messages.len();
        slot.messages = messages;
        slot.cursor = Some(page.cursor);
        slot.applied = ticket.number;
        slot.live_log.retain(|(seq, _)| *seq >= ticket.live_mark);
        release_live_log(slot);

        Ok(LoadOutcome::Applied { messages: count })
    }

    fn issue_ticket(&self, conversation: &Conversation) -> Ticket {
        let mut state = self.state();
        let epoch = state.epoch;
        let slot = state.slots.entry(conversation.clone()).or_default();
        slot.issued += 1;
        slot.in_flight += 1;

        Ticket {
            epoch,
            number: slot.issued,
            live_mark: slot.live_seq,
        }
    }

    /// Append a live message unless it duplicates one already cached.
    ///
    /// Returns whether the message was added. A message without a usable
    /// sender is attributed to its author under the current user's name.
    pub fn add_message(&self, conversation: &Conversation, mut message: Message) -> Result<bool> {
        if let Err(e) = conversation.validate() {
            log::error!("Cannot add message: {}", e);
            return Err(e);
        }

        if !message.has_valid_sender() {
            let name = self
                .inner
                .session
                .current_user_name()
                .unwrap_or_else(|| UNKNOWN_SENDER.to_owned());
            message.sender = Some(Sender::new(message.author_id.clone(), name));
        }

        let mut state = self.state();
        let slot = state.slots.entry(conversation.clone()).or_default();

        if slot.messages.iter().any(|m| is_live_duplicate(m, &message)) {
            log::debug!("Message already cached for {}, skipping", conversation);
            return Ok(false);
        }

        if slot.in_flight > 0 {
            slot.live_log.push((slot.live_seq, message.clone()));
        }
        slot.live_seq += 1;
        slot.messages.push(message);
        log::debug!("Message added to {}", conversation);

        Ok(true)
    }

    /// Empty a conversation's list. The pagination cursor is kept.
    pub fn clear_conversation(&self, conversation: &Conversation) -> Result<()> {
        if let Err(e) = conversation.validate() {
            log::error!("Cannot clear conversation: {}", e);
            return Err(e);
        }

        let mut state = self.state();
        let slot = state.slots.entry(conversation.clone()).or_default();
        slot.messages.clear();
        slot.live_log.clear();
        Ok(())
    }

    /// Messages of the active conversation.
    pub fn current_messages(&self) -> Vec<Message> {
        let state = self.state();
        state
            .active
            .as_ref()
            .and_then(|c| state.slots.get(c))
            .map(|slot| slot.messages.clone())
            .unwrap_or_default()
    }

    /// Messages cached for any conversation.
    pub fn messages(&self, conversation: &Conversation) -> Vec<Message> {
        self.state()
            .slots
            .get(conversation)
            .map(|slot| slot.messages.clone())
            .unwrap_or_default()
    }

    /// Pagination state from the last applied history page.
    pub fn cursor(&self, conversation: &Conversation) -> Option<PageCursor> {
        self.state().slots.get(conversation).and_then(|s| s.cursor)
    }

    /// Currently active conversation.
    pub fn active(&self) -> Option<Conversation> {
        self.state().active.clone()
    }

    /// Conversations holding cached state.
    pub fn cached_conversations(&self) -> Vec<Conversation> {
        self.state().slots.keys().cloned().collect()
    }

    /// Drop every conversation, for session teardown.
    ///
    /// Loads still in flight are discarded when they complete.
    pub fn reset(&self) {
        let mut state = self.state();
        state.epoch += 1;
        state.active = None;
        state.slots.clear();
        log::debug!("Conversation cache reset");
    }
}

/// Forget logged live messages once no load can still need them.
fn release_live_log(slot: &mut Slot) {
    if slot.in_flight == 0 {
        slot.live_log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HistoryPage;
    use crate::client::{Session, SessionHandle};
    use crate::models::{ConversationKind, MessageId, User};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn session() -> SessionHandle {
        SessionHandle::new(Some(Session::new(
            "token",
            User {
                id: "1".into(),
                name: "Ana".into(),
                ..Default::default()
            },
        )))
    }

    fn page(messages: Vec<Message>) -> HistoryPage {
        HistoryPage {
            cursor: PageCursor {
                total: messages.len() as u64,
                page: 1,
                total_pages: 1,
            },
            messages,
        }
    }

    fn ids(messages: &[Message]) -> Vec<Option<MessageId>> {
        messages.iter().map(|m| m.id.clone()).collect()
    }

    /// Answers queries from a queue of prepared results, or gates each
    /// answer behind a oneshot the test resolves.
    #[derive(Default)]
    struct FakeHistory {
        calls: AtomicUsize,
        queries: Mutex<Vec<HistoryQuery>>,
        pages: Mutex<VecDeque<Result<HistoryPage>>>,
        gates: Mutex<VecDeque<oneshot::Receiver<Result<HistoryPage>>>>,
    }

    impl FakeHistory {
        fn with_pages(pages: Vec<Result<HistoryPage>>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into()),
                ..Default::default()
            })
        }

        fn gate(&self) -> oneshot::Sender<Result<HistoryPage>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push_back(rx);
            tx
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HistorySource for FakeHistory {
        async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.clone());

            let gate = self.gates.lock().unwrap().pop_front();
            if let Some(gate) = gate {
                return gate
                    .await
                    .unwrap_or_else(|_| Err(Error::Internal("gate dropped".into())));
            }

            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(page(Vec::new())))
        }
    }

    fn cache_with(history: Arc<FakeHistory>) -> ConversationCache {
        ConversationCache::new(history, Arc::new(session()))
    }

    #[tokio::test]
    async fn test_load_sorts_history() {
        let history = FakeHistory::with_pages(vec![Ok(page(vec![
            Message::new("hi").with_id("2").at(t0() + Duration::seconds(1)),
            Message::new("yo").with_id("1").at(t0()),
        ]))]);
        let cache = cache_with(history);
        let conv = Conversation::group("3");

        match cache.select_conversation(&conv).unwrap() {
            Selection::Loading(handle) => {
                assert_eq!(
                    handle.await.unwrap().unwrap(),
                    LoadOutcome::Applied { messages: 2 }
                );
            }
            Selection::Unchanged => panic!("expected a load"),
        }

        assert_eq!(
            ids(&cache.current_messages()),
            vec![Some("1".into()), Some("2".into())]
        );
        assert_eq!(cache.cursor(&conv).map(|c| c.total), Some(2));
    }

    #[tokio::test]
    async fn test_reselect_does_not_refetch() {
        let history = FakeHistory::with_pages(Vec::new());
        let cache = cache_with(history.clone());
        let conv = Conversation::group("3");

        if let Selection::Loading(handle) = cache.select_conversation(&conv).unwrap() {
            handle.await.unwrap().unwrap();
        }
        assert!(matches!(
            cache.select_conversation(&Conversation::group("3")).unwrap(),
            Selection::Unchanged
        ));
        assert_eq!(history.calls(), 1);

        // Same id, different kind, is a different conversation.
        if let Selection::Loading(handle) =
            cache.select_conversation(&Conversation::direct("3")).unwrap()
        {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(history.calls(), 2);
        assert_eq!(cache.active().map(|c| c.kind), Some(ConversationKind::Direct));
    }

    #[tokio::test]
    async fn test_invalid_descriptor_is_rejected() {
        let history = FakeHistory::with_pages(Vec::new());
        let cache = cache_with(history.clone());
        let bad = Conversation::group("");

        assert!(matches!(
            cache.select_conversation(&bad),
            Err(Error::InvalidArgument(_))
        ));
        assert!(cache.add_message(&bad, Message::new("x")).is_err());
        assert!(cache.clear_conversation(&bad).is_err());
        assert!(cache.load_history(&bad, 1, 50, false).await.is_err());
        assert_eq!(cache.active(), None);
        assert_eq!(history.calls(), 0);
    }

    #[tokio::test]
    async fn test_direct_load_needs_user() {
        let history = FakeHistory::with_pages(Vec::new());
        let cache = ConversationCache::new(history.clone(), Arc::new(SessionHandle::default()));

        let err = cache
            .load_history(&Conversation::direct("9"), 1, 50, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IdentityUnavailable(_)));
        assert_eq!(history.calls(), 0);

        let cache = cache_with(history.clone());
        cache
            .load_history(&Conversation::direct("9"), 2, 20, true)
            .await
            .unwrap();
        let query = history.queries.lock().unwrap()[0].clone();
        assert_eq!(query.me, Some("1".into()));
        assert_eq!(query.page, 2);
        assert!(query.unread_only);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_cached_list() {
        let history = FakeHistory::with_pages(vec![
            Ok(page(vec![Message::new("a").with_id("1").at(t0())])),
            Err(Error::api("api", "down")),
        ]);
        let cache = cache_with(history);
        let conv = Conversation::group("3");

        cache.load_history(&conv, 1, 50, false).await.unwrap();
        let cursor = cache.cursor(&conv);

        assert!(cache.load_history(&conv, 1, 50, false).await.is_err());
        assert_eq!(ids(&cache.messages(&conv)), vec![Some("1".into())]);
        assert_eq!(cache.cursor(&conv), cursor);
    }

    #[tokio::test]
    async fn test_add_message_skips_known_id() {
        let history = FakeHistory::with_pages(vec![Ok(page(vec![
            Message::new("a").with_id("1").at(t0()),
        ]))]);
        let cache = cache_with(history);
        let conv = Conversation::group("3");
        cache.load_history(&conv, 1, 50, false).await.unwrap();

        let added = cache
            .add_message(&conv, Message::new("edited").with_id("1").at(t0()))
            .unwrap();
        assert!(!added);
        assert_eq!(cache.messages(&conv).len(), 1);
    }

    #[test]
    fn test_add_message_tolerance_window() {
        let cache = cache_with(FakeHistory::with_pages(Vec::new()));
        let conv = Conversation::group("3");

        let first = Message::new("ok").with_author("5").at(t0());
        let echo = Message::new("ok")
            .with_author("5")
            .at(t0() + Duration::milliseconds(1000));
        let later = Message::new("ok")
            .with_author("5")
            .at(t0() + Duration::milliseconds(6000));

        assert!(cache.add_message(&conv, first).unwrap());
        assert!(!cache.add_message(&conv, echo).unwrap());
        assert!(cache.add_message(&conv, later).unwrap());
        assert_eq!(cache.messages(&conv).len(), 2);
    }

    #[test]
    fn test_add_message_fills_sender() {
        let cache = cache_with(FakeHistory::with_pages(Vec::new()));
        let conv = Conversation::direct("9");

        cache
            .add_message(&conv, Message::new("hola").with_author("9").at(t0()))
            .unwrap();

        let stored = &cache.messages(&conv)[0];
        let sender = stored.sender.clone().unwrap();
        assert_eq!(sender.id, Some("9".into()));
        assert_eq!(sender.name.as_deref(), Some("Ana"));

        let anonymous = ConversationCache::new(
            FakeHistory::with_pages(Vec::new()),
            Arc::new(SessionHandle::default()),
        );
        anonymous
            .add_message(&conv, Message::new("hola").at(t0()))
            .unwrap();
        assert_eq!(anonymous.messages(&conv)[0].sender_name(), UNKNOWN_SENDER);
    }

    #[test]
    fn test_live_appends_are_not_resorted() {
        let cache = cache_with(FakeHistory::with_pages(Vec::new()));
        let conv = Conversation::group("3");

        cache
            .add_message(&conv, Message::new("new").with_id("2").at(t0() + Duration::seconds(60)))
            .unwrap();
        cache
            .add_message(&conv, Message::new("old").with_id("1").at(t0()))
            .unwrap();

        assert_eq!(
            ids(&cache.messages(&conv)),
            vec![Some("2".into()), Some("1".into())]
        );
    }

    #[tokio::test]
    async fn test_clear_then_reload() {
        let history = FakeHistory::with_pages(vec![
            Ok(page(vec![Message::new("a").with_id("1").at(t0())])),
            Ok(page(vec![Message::new("a").with_id("1").at(t0())])),
        ]);
        let cache = cache_with(history);
        let conv = Conversation::group("3");

        if let Selection::Loading(handle) = cache.select_conversation(&conv).unwrap() {
            handle.await.unwrap().unwrap();
        }
        let cursor = cache.cursor(&conv);

        cache.clear_conversation(&conv).unwrap();
        assert!(cache.current_messages().is_empty());
        assert_eq!(cache.cursor(&conv), cursor);

        cache.load_history(&conv, 1, 50, false).await.unwrap();
        assert_eq!(cache.current_messages().len(), 1);
    }

    #[test]
    fn test_no_active_conversation() {
        let cache = cache_with(FakeHistory::with_pages(Vec::new()));
        cache
            .add_message(&Conversation::group("3"), Message::new("x"))
            .unwrap();
        assert!(cache.current_messages().is_empty());
    }

    #[tokio::test]
    async fn test_live_message_survives_concurrent_load() {
        let history = Arc::new(FakeHistory::default());
        let gate = history.gate();
        let cache = cache_with(history.clone());
        let conv = Conversation::group("3");

        let loader = {
            let cache = cache.clone();
            let conv = conv.clone();
            tokio::spawn(async move { cache.load_history(&conv, 1, 50, false).await })
        };
        while history.calls() == 0 {
            tokio::task::yield_now().await;
        }

        let live = Message::new("live").with_author("2").at(t0() + Duration::seconds(30));
        assert!(cache.add_message(&conv, live).unwrap());

        gate.send(Ok(page(vec![
            Message::new("old").with_id("1").at(t0()),
        ])))
        .unwrap();
        loader.await.unwrap().unwrap();

        let contents: Vec<String> = cache.messages(&conv).into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["old".to_owned(), "live".to_owned()]);
    }

    #[tokio::test]
    async fn test_persisted_echo_replaces_live_copy() {
        let history = Arc::new(FakeHistory::default());
        let gate = history.gate();
        let cache = cache_with(history.clone());
        let conv = Conversation::group("3");

        let loader = {
            let cache = cache.clone();
            let conv = conv.clone();
            tokio::spawn(async move { cache.load_history(&conv, 1, 50, false).await })
        };
        while history.calls() == 0 {
            tokio::task::yield_now().await;
        }

        cache
            .add_message(&conv, Message::new("hola").with_author("1").at(t0()))
            .unwrap();

        gate.send(Ok(page(vec![Message::new("hola")
            .with_id("40")
            .with_author("1")
            .at(t0() + Duration::milliseconds(800))])))
        .unwrap();
        loader.await.unwrap().unwrap();

        let messages = cache.messages(&conv);
        assert_eq!(ids(&messages), vec![Some("40".into())]);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let history = Arc::new(FakeHistory::default());
        let first_gate = history.gate();
        let second_gate = history.gate();
        let cache = cache_with(history.clone());
        let conv = Conversation::group("3");

        let first = {
            let cache = cache.clone();
            let conv = conv.clone();
            tokio::spawn(async move { cache.load_history(&conv, 1, 50, false).await })
        };
        while history.calls() < 1 {
            tokio::task::yield_now().await;
        }
        let second = {
            let cache = cache.clone();
            let conv = conv.clone();
            tokio::spawn(async move { cache.load_history(&conv, 1, 50, false).await })
        };
        while history.calls() < 2 {
            tokio::task::yield_now().await;
        }

        second_gate
            .send(Ok(page(vec![Message::new("fresh").with_id("2").at(t0())])))
            .unwrap();
        assert_eq!(
            second.await.unwrap().unwrap(),
            LoadOutcome::Applied { messages: 1 }
        );

        first_gate
            .send(Ok(page(vec![Message::new("old").with_id("1").at(t0())])))
            .unwrap();
        assert_eq!(first.await.unwrap().unwrap(), LoadOutcome::Stale);

        assert_eq!(ids(&cache.messages(&conv)), vec![Some("2".into())]);
    }

    #[tokio::test]
    async fn test_load_for_inactive_conversation_still_lands() {
        let history = Arc::new(FakeHistory::default());
        let gate = history.gate();
        let cache = cache_with(history.clone());
        let first = Conversation::group("3");
        let second = Conversation::group("4");

        let handle = match cache.select_conversation(&first).unwrap() {
            Selection::Loading(handle) => handle,
            Selection::Unchanged => panic!("expected a load"),
        };
        while history.calls() == 0 {
            tokio::task::yield_now().await;
        }
        if let Selection::Loading(h) = cache.select_conversation(&second).unwrap() {
            h.await.unwrap().unwrap();
        }

        gate.send(Ok(page(vec![Message::new("a").with_id("1").at(t0())])))
            .unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(cache.active(), Some(second));
        assert!(cache.current_messages().is_empty());
        assert_eq!(cache.messages(&first).len(), 1);
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_load() {
        let history = Arc::new(FakeHistory::default());
        let gate = history.gate();
        let cache = cache_with(history.clone());
        let conv = Conversation::group("3");

        let handle = match cache.select_conversation(&conv).unwrap() {
            Selection::Loading(handle) => handle,
            Selection::Unchanged => panic!("expected a load"),
        };
        while history.calls() == 0 {
            tokio::task::yield_now().await;
        }

        cache.reset();
        gate.send(Ok(page(vec![Message::new("a").with_id("1").at(t0())])))
            .unwrap();

        assert_eq!(handle.await.unwrap().unwrap(), LoadOutcome::Stale);
        assert!(cache.messages(&conv).is_empty());
        assert_eq!(cache.active(), None);
        assert!(cache.cached_conversations().is_empty());
    }

    #[tokio::test]
    async fn test_failure_after_reset_leaves_no_slot() {
        let history = Arc::new(FakeHistory::default());
        let gate = history.gate();
        let cache = cache_with(history.clone());
        let conv = Conversation::group("3");

        let loading = {
            let cache = cache.clone();
            let conv = conv.clone();
            tokio::spawn(async move { cache.load_history(&conv, 1, 50, false).await })
        };
        while history.calls() == 0 {
            tokio::task::yield_now().await;
        }

        cache.reset();
        gate.send(Err(Error::api("503", "unavailable"))).unwrap();

        assert!(loading.await.unwrap().is_err());
        assert!(cache.cached_conversations().is_empty());
    }

    #[test]
    fn test_select_outside_runtime() {
        let cache = cache_with(FakeHistory::with_pages(Vec::new()));
        assert!(matches!(
            cache.select_conversation(&Conversation::group("3")),
            Err(Error::Internal(_))
        ));
        assert_eq!(cache.active(), None);
    }
}
