//! Chat command-line client.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{auth, chat, group, message, role, user, Target};
use tracing_subscriber::EnvFilter;

/// Command-line client for the chat backend
#[derive(Parser)]
#[command(name = "rchat")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "plain")]
    format: output::OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API base URL, overriding the configured one
    #[arg(long, global = true, env = "RCHAT_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage authentication
    Auth {
        #[command(subcommand)]
        action: auth::AuthAction,
    },

    /// Group operations
    #[command(alias = "g")]
    Group {
        #[command(subcommand)]
        action: group::GroupAction,
    },

    /// User operations
    #[command(alias = "u")]
    User {
        #[command(subcommand)]
        action: user::UserAction,
    },

    /// Role operations
    #[command(alias = "r")]
    Role {
        #[command(subcommand)]
        action: role::RoleAction,
    },

    /// Message operations
    #[command(alias = "m")]
    Message {
        #[command(subcommand)]
        action: message::MessageAction,
    },

    /// Open an interactive conversation
    Chat {
        #[command(flatten)]
        target: Target,
        /// Seconds between checks for new messages
        #[arg(short, long, default_value = "3")]
        interval: u64,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Change connection settings
    Set {
        /// API base URL
        #[arg(long)]
        url: Option<String>,
        /// Connection timeout in seconds
        #[arg(long)]
        connect_timeout: Option<u64>,
        /// Read timeout in seconds
        #[arg(long)]
        read_timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_writer(std::io::stderr)
        .init();

    let base_url = cli.base_url.as_deref();

    match cli.command {
        Commands::Auth { action } => auth::handle(action, base_url).await,
        Commands::Group { action } => group::handle(action, cli.format, base_url).await,
        Commands::User { action } => user::handle(action, cli.format, cli.verbose, base_url).await,
        Commands::Role { action } => role::handle(action, cli.format, base_url).await,
        Commands::Message { action } => message::handle(action, cli.format, base_url).await,
        Commands::Chat { target, interval } => chat::run(target, interval, base_url).await,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => show_config(base_url),
            ConfigAction::Set {
                url,
                connect_timeout,
                read_timeout,
            } => set_config(url, connect_timeout, read_timeout),
        },
    }
}

fn show_config(base_url: Option<&str>) -> Result<()> {
    let cfg = config::load_config()?;
    println!("Config file: {}", config::config_path()?.display());
    println!("Session file: {}", config::session_path()?.display());
    println!(
        "Base URL: {}",
        base_url
            .or(cfg.server.base_url.as_deref())
            .unwrap_or(rchat::client::DEFAULT_BASE_URL)
    );
    if let Some(secs) = cfg.server.connect_timeout_secs {
        println!("Connect timeout: {}s", secs);
    }
    if let Some(secs) = cfg.server.read_timeout_secs {
        println!("Read timeout: {}s", secs);
    }
    Ok(())
}

fn set_config(
    url: Option<String>,
    connect_timeout: Option<u64>,
    read_timeout: Option<u64>,
) -> Result<()> {
    let mut cfg = config::load_config()?;
    if url.is_some() {
        cfg.server.base_url = url;
    }
    if connect_timeout.is_some() {
        cfg.server.connect_timeout_secs = connect_timeout;
    }
    if read_timeout.is_some() {
        cfg.server.read_timeout_secs = read_timeout;
    }
    config::save_config(&cfg)?;
    println!("Saved {}", config::config_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_command() {
        let cli = Cli::try_parse_from(["rchat", "chat", "-w", "9", "--interval", "5"]).unwrap();
        match cli.command {
            Commands::Chat { target, interval } => {
                assert_eq!(target.conversation(), rchat::Conversation::direct("9"));
                assert_eq!(interval, 5);
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rchat", "message", "history", "-g", "3", "-f", "json", "--base-url", "http://h/api/",
        ])
        .unwrap();
        assert!(matches!(cli.format, output::OutputFormat::Json));
        assert_eq!(cli.base_url.as_deref(), Some("http://h/api/"));
    }
}
