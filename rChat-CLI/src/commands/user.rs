//! User commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::config::build_authed_client;
use crate::output::{print_table, OutputFormat, UserRow};

#[derive(Subcommand)]
pub enum UserAction {
    /// List users
    #[command(alias = "ls")]
    List {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Users per page
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },

    /// View current user's profile
    Me,
}

pub async fn handle(
    action: UserAction,
    format: OutputFormat,
    verbose: bool,
    base_url: Option<&str>,
) -> Result<()> {
    match action {
        UserAction::List { page, limit } => list_users(base_url, page, limit, format).await,
        UserAction::Me => get_me(base_url, format, verbose).await,
    }
}

async fn list_users(base_url: Option<&str>, page: u32, limit: u32, format: OutputFormat) -> Result<()> {
    let client = build_authed_client(base_url).await?;
    let users = client.users().list(page, limit).await?;

    let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
    print_table(rows, format);
    Ok(())
}

async fn get_me(base_url: Option<&str>, format: OutputFormat, verbose: bool) -> Result<()> {
    let client = build_authed_client(base_url).await?;
    let user = client.users().me()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        OutputFormat::Table => {
            print_table(vec![UserRow::from(&user)], format);
        }
        OutputFormat::Plain => {
            println!("{} {}", user.name.bold(), format!("({})", user.id).dimmed());
            if let Some(login) = &user.network_user {
                match &user.domain {
                    Some(domain) => println!("Login: {}\\{}", domain, login),
                    None => println!("Login: {}", login),
                }
            }
            if verbose || !user.groups.is_empty() {
                println!("Groups:");
                for group in &user.groups {
                    println!("  [{}] {}", group.id.to_string().cyan(), group.name);
                }
            }
            if verbose {
                if let Some(role) = &user.role_id {
                    println!("Role: {}", role);
                }
                if let Some(photo) = &user.photo {
                    println!("Photo: {}", photo);
                }
            }
        }
    }
    Ok(())
}
