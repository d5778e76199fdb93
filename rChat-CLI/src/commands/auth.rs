//! Authentication commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use rchat::SessionProvider;
use std::path::PathBuf;

use crate::config::build_client;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in with network user and password
    Login {
        /// Network user name
        #[arg(short, long)]
        user: String,
        /// Password
        #[arg(short, long, env = "RCHAT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log out and forget the saved session
    Logout,
    /// Show current session
    Status,
    /// Register a new account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Network user name
        #[arg(short, long)]
        user: String,
        /// Login domain
        #[arg(short, long)]
        domain: String,
        /// Password
        #[arg(short, long, env = "RCHAT_PASSWORD", hide_env_values = true)]
        password: String,
        /// Role ID (see `rchat role list`)
        #[arg(short, long)]
        role: String,
        /// Profile photo
        #[arg(long)]
        photo: Option<PathBuf>,
    },
}

pub async fn handle(action: AuthAction, base_url: Option<&str>) -> Result<()> {
    match action {
        AuthAction::Login { user, password } => login(base_url, &user, &password).await,
        AuthAction::Logout => logout(base_url).await,
        AuthAction::Status => status(base_url).await,
        AuthAction::Register {
            name,
            user,
            domain,
            password,
            role,
            photo,
        } => register(base_url, name, user, domain, password, role, photo).await,
    }
}

async fn login(base_url: Option<&str>, user: &str, password: &str) -> Result<()> {
    let client = build_client(base_url).await?;
    let session = client.auth().login(user, password).await?;

    println!(
        "Logged in as {} ({})",
        session.user.name.green(),
        session.user.id
    );
    if let Some(group) = session.user.primary_group() {
        println!("Default group: {}", group.to_string().cyan());
    }
    Ok(())
}

async fn logout(base_url: Option<&str>) -> Result<()> {
    let client = build_client(base_url).await?;
    client.logout().await?;

    println!("Logged out");
    Ok(())
}

async fn status(base_url: Option<&str>) -> Result<()> {
    let client = build_client(base_url).await?;

    match client.session() {
        Some(session) => println!(
            "Logged in as {} ({})",
            session.user.name.green(),
            session.user.id
        ),
        None => println!("Not logged in"),
    }
    Ok(())
}

async fn register(
    base_url: Option<&str>,
    name: String,
    user: String,
    domain: String,
    password: String,
    role: String,
    photo: Option<PathBuf>,
) -> Result<()> {
    let client = build_client(base_url).await?;

    let mut request = client
        .auth()
        .register()
        .name(name)
        .network_user(user)
        .domain(domain)
        .password(password)
        .role(role);

    if let Some(path) = photo {
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read photo {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "foto".to_string());
        request = request.photo(file_name, bytes);
    }

    let description = request.send().await?;
    if description.is_empty() {
        println!("Account registered");
    } else {
        println!("{}", description);
    }
    Ok(())
}
