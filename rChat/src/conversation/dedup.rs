//! Duplicate detection and history normalization.
//!
//! Two predicates exist. History pages come from one canonical source, so
//! duplicates there are exact clones. A live message and its persisted
//! counterpart are stamped independently, so the live path accepts a small
//! timestamp skew.

use crate::models::{Message, Sender};

/// Maximum timestamp skew, in milliseconds, between a live message and
/// its persisted copy.
pub const LIVE_DUPLICATE_WINDOW_MS: i64 = 5000;

fn same_id(a: &Message, b: &Message) -> bool {
    matches!((&a.id, &b.id), (Some(x), Some(y)) if x == y)
}

fn same_body(a: &Message, b: &Message) -> bool {
    a.content == b.content && a.author_id == b.author_id
}

/// Exact duplicate: same id, or same content, author and timestamp.
pub fn is_exact_duplicate(a: &Message, b: &Message) -> bool {
    same_id(a, b) || (same_body(a, b) && a.created_at == b.created_at)
}

/// Live duplicate: like [`is_exact_duplicate`] but timestamps closer than
/// [`LIVE_DUPLICATE_WINDOW_MS`] also match.
pub fn is_live_duplicate(a: &Message, b: &Message) -> bool {
    if same_id(a, b) {
        return true;
    }
    if !same_body(a, b) {
        return false;
    }

    match (a.created_at, b.created_at) {
        (None, None) => true,
        (Some(x), Some(y)) => (x - y).num_milliseconds().abs() < LIVE_DUPLICATE_WINDOW_MS,
        _ => false,
    }
}

/// Prepare a history page for the cache: placeholder senders, ascending
/// timestamps, exact duplicates removed.
///
/// The sort is stable and puts messages without a timestamp first. A
/// message is kept only if no earlier message of the sorted page matches
/// it, dropped ones included.
pub fn normalize_history(mut messages: Vec<Message>) -> Vec<Message> {
    for msg in messages.iter_mut().filter(|m| !m.has_valid_sender()) {
        log::warn!(
            "Message {:?} has no valid sender, using placeholder",
            msg.id
        );
        msg.sender = Some(Sender::unknown());
    }

    messages.sort_by_key(|m| m.created_at);

    let keep: Vec<bool> = messages
        .iter()
        .enumerate()
        .map(|(i, msg)| !messages[..i].iter().any(|e| is_exact_duplicate(e, msg)))
        .collect();

    messages
        .into_iter()
        .zip(keep)
        .filter_map(|(msg, keep)| keep.then_some(msg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageId, UNKNOWN_SENDER};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn ids(messages: &[Message]) -> Vec<Option<MessageId>> {
        messages.iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn test_history_is_sorted_ascending() {
        let page = vec![
            Message::new("hi").with_id("2").at(t0() + Duration::seconds(1)),
            Message::new("yo").with_id("1").at(t0()),
        ];

        let normalized = normalize_history(page);
        assert_eq!(ids(&normalized), vec![Some("1".into()), Some("2".into())]);
    }

    #[test]
    fn test_history_dedup_compares_against_dropped_messages() {
        let page = vec![
            Message::new("p").with_id("1").with_author("5").at(t0()),
            Message::new("q").with_id("1").with_author("5").at(t0()),
            Message::new("q").with_author("5").at(t0()),
        ];

        let normalized = normalize_history(page);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].content, "p");
    }

    #[test]
    fn test_history_drops_exact_duplicates_only() {
        let page = vec![
            Message::new("ok").with_author("5").at(t0()),
            Message::new("ok").with_author("5").at(t0()),
            Message::new("ok").with_author("5").at(t0() + Duration::milliseconds(1)),
            Message::new("dup id").with_id("7").at(t0() + Duration::seconds(2)),
            Message::new("other").with_id("7").at(t0() + Duration::seconds(3)),
        ];

        let normalized = normalize_history(page);
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[2].content, "dup id");
    }

    #[test]
    fn test_history_assigns_placeholder_sender() {
        let normalized = normalize_history(vec![Message::new("x").at(t0())]);
        assert_eq!(normalized[0].sender_name(), UNKNOWN_SENDER);
        assert!(normalized[0].has_valid_sender());
    }

    #[test]
    fn test_missing_timestamps_sort_first() {
        let normalized = normalize_history(vec![
            Message::new("late").with_id("1").at(t0()),
            Message::new("unknown").with_id("2"),
        ]);
        assert_eq!(normalized[0].content, "unknown");
    }

    #[test]
    fn test_live_window() {
        let a = Message::new("ok").with_author("5").at(t0());
        let near = Message::new("ok").with_author("5").at(t0() + Duration::milliseconds(1000));
        let far = Message::new("ok").with_author("5").at(t0() + Duration::milliseconds(6000));
        let edge = Message::new("ok").with_author("5").at(t0() + Duration::milliseconds(5000));

        assert!(is_live_duplicate(&a, &near));
        assert!(is_live_duplicate(&near, &a));
        assert!(!is_live_duplicate(&a, &far));
        assert!(!is_live_duplicate(&a, &edge));
        assert!(!is_exact_duplicate(&a, &near));
    }

    #[test]
    fn test_absent_ids_never_match() {
        let a = Message::new("one").with_author("5").at(t0());
        let b = Message::new("two").with_author("5").at(t0());
        assert!(!is_exact_duplicate(&a, &b));
        assert!(!is_live_duplicate(&a, &b));
    }

    #[test]
    fn test_different_author_is_distinct() {
        let a = Message::new("ok").with_author("5").at(t0());
        let b = Message::new("ok").with_author("6").at(t0());
        assert!(!is_live_duplicate(&a, &b));
    }
}
