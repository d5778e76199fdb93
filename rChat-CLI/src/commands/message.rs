//! Message commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use rchat::SessionProvider;

use super::Target;
use crate::config::build_authed_client;
use crate::output::{print_table, MessageRow, OutputFormat};

#[derive(Subcommand)]
pub enum MessageAction {
    /// Read a conversation's history
    #[command(alias = "ls")]
    History {
        #[command(flatten)]
        target: Target,
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Messages per page
        #[arg(short, long, default_value = "50")]
        limit: u32,
        /// Only unread messages
        #[arg(short, long)]
        unread: bool,
    },

    /// Send a message
    Send {
        #[command(flatten)]
        target: Target,
        /// Message content
        content: String,
    },
}

pub async fn handle(action: MessageAction, format: OutputFormat, base_url: Option<&str>) -> Result<()> {
    match action {
        MessageAction::History {
            target,
            page,
            limit,
            unread,
        } => history(base_url, &target, page, limit, unread, format).await,
        MessageAction::Send { target, content } => send(base_url, &target, &content).await,
    }
}

async fn history(
    base_url: Option<&str>,
    target: &Target,
    page: u32,
    limit: u32,
    unread: bool,
    format: OutputFormat,
) -> Result<()> {
    let client = build_authed_client(base_url).await?;
    let conversation = target.conversation();

    // Going through the cache sorts and deduplicates the page.
    let cache = client.conversation_cache();
    cache.load_history(&conversation, page, limit, unread).await?;

    if matches!(format, OutputFormat::Plain) {
        if let Some(cursor) = cache.cursor(&conversation) {
            println!(
                "{} (page {}/{}, {} messages)\n",
                conversation.to_string().green(),
                cursor.page,
                cursor.total_pages.max(1),
                cursor.total
            );
        }
    }

    let me = client.current_user_id();
    let rows: Vec<MessageRow> = cache
        .messages(&conversation)
        .iter()
        .map(|m| MessageRow::new(m, me.as_ref()))
        .collect();
    print_table(rows, format);
    Ok(())
}

async fn send(base_url: Option<&str>, target: &Target, content: &str) -> Result<()> {
    let client = build_authed_client(base_url).await?;
    let conversation = target.conversation();

    let stored = client
        .messages()
        .send(conversation.clone())
        .content(content)
        .send()
        .await?;

    match stored.id {
        Some(id) => println!("Message {} sent to {}", id, conversation),
        None => println!("Message sent to {}", conversation),
    }
    Ok(())
}
