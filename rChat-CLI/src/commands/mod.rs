//! Subcommand implementations.

pub mod auth;
pub mod chat;
pub mod group;
pub mod message;
pub mod role;
pub mod user;

use clap::Args;
use rchat::Conversation;

/// Conversation selector shared by message commands.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct Target {
    /// Group ID
    #[arg(short, long)]
    pub group: Option<String>,
    /// Other user's ID, for a direct conversation
    #[arg(short = 'w', long = "with")]
    pub with: Option<String>,
}

impl Target {
    /// The selected conversation.
    pub fn conversation(&self) -> Conversation {
        match (&self.group, &self.with) {
            (Some(group), _) => Conversation::group(group.as_str()),
            (None, Some(user)) => Conversation::direct(user.as_str()),
            (None, None) => Conversation::group(""),
        }
    }
}
