//! Interactive chat session.
//!
//! Lines typed on stdin are sent to the conversation. The first history
//! page is polled in the background and new messages are printed as they
//! arrive; the cache drops echoes of messages already shown.

use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use rchat::api::DEFAULT_PAGE_SIZE;
use rchat::{ChatClient, Conversation, ConversationCache, Message, Selection, SessionProvider, UserId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use super::Target;
use crate::config::build_authed_client;
use crate::output::{MessageRow, PlainPrint};

pub async fn run(target: Target, interval_secs: u64, base_url: Option<&str>) -> Result<()> {
    let client = build_authed_client(base_url).await?;
    let conversation = target.conversation();
    let cache = client.conversation_cache();
    let me = client.current_user_id();

    if let Selection::Loading(handle) = cache.select_conversation(&conversation)? {
        handle.await.context("History load task failed")??;
    }
    print_all(&cache, me.as_ref());

    println!(
        "{}",
        format!("Chatting in {}. /reload to refresh, /quit to leave.", conversation).dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately and history was just loaded.
    ticker.tick().await;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match line.trim() {
                    "" => {}
                    "/quit" | "/exit" => break,
                    "/reload" => reload(&cache, &conversation, me.as_ref()).await?,
                    content => send(&client, &cache, &conversation, content, me.as_ref()).await?,
                }
            }
            _ = ticker.tick() => poll(&client, &cache, &conversation, me.as_ref()).await?,
        }
    }

    Ok(())
}

async fn send(
    client: &ChatClient,
    cache: &ConversationCache,
    conversation: &Conversation,
    content: &str,
    me: Option<&UserId>,
) -> Result<()> {
    match client
        .messages()
        .send(conversation.clone())
        .content(content)
        .send()
        .await
    {
        Ok(stored) => show_if_new(cache, conversation, stored, me),
        Err(e) => keep_going(e, "Not sent"),
    }
}

async fn reload(
    cache: &ConversationCache,
    conversation: &Conversation,
    me: Option<&UserId>,
) -> Result<()> {
    match cache
        .load_history(conversation, 1, DEFAULT_PAGE_SIZE, false)
        .await
    {
        Ok(_) => {
            print_all(cache, me);
            Ok(())
        }
        Err(e) => keep_going(e, "Reload failed"),
    }
}

/// Report a failed request and stay in the chat, unless the session is gone.
fn keep_going(e: rchat::Error, what: &str) -> Result<()> {
    if e.is_auth_error() {
        return Err(e.into());
    }
    tracing::warn!(error = %e, retryable = e.is_retryable(), "{}", what);
    eprintln!("{}", format!("{}: {}", what, e).red());
    Ok(())
}

async fn poll(
    client: &ChatClient,
    cache: &ConversationCache,
    conversation: &Conversation,
    me: Option<&UserId>,
) -> Result<()> {
    match client.messages().history(conversation.clone()).send().await {
        Ok(page) => {
            let mut incoming = page.messages;
            incoming.sort_by_key(|m| m.created_at);
            for message in incoming {
                show_if_new(cache, conversation, message, me)?;
            }
        }
        Err(e) if e.is_auth_error() => return Err(e.into()),
        Err(e) => tracing::debug!(error = %e, "poll failed"),
    }
    Ok(())
}

fn show_if_new(
    cache: &ConversationCache,
    conversation: &Conversation,
    message: Message,
    me: Option<&UserId>,
) -> Result<()> {
    let row = MessageRow::new(&message, me);
    if cache.add_message(conversation, message)? {
        row.plain_print();
    }
    Ok(())
}

fn print_all(cache: &ConversationCache, me: Option<&UserId>) {
    for message in cache.current_messages() {
        MessageRow::new(&message, me).plain_print();
    }
}
