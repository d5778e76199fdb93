//! Group commands.

use anyhow::Result;
use clap::Subcommand;

use crate::config::build_authed_client;
use crate::output::{print_table, GroupRow, OutputFormat};

#[derive(Subcommand)]
pub enum GroupAction {
    /// List chat groups
    #[command(alias = "ls")]
    List {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Groups per page
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
}

pub async fn handle(action: GroupAction, format: OutputFormat, base_url: Option<&str>) -> Result<()> {
    match action {
        GroupAction::List { page, limit } => list_groups(base_url, page, limit, format).await,
    }
}

async fn list_groups(base_url: Option<&str>, page: u32, limit: u32, format: OutputFormat) -> Result<()> {
    let client = build_authed_client(base_url).await?;
    let groups = client.groups().list().page(page).limit(limit).send().await?;

    let rows: Vec<GroupRow> = groups.iter().map(GroupRow::from).collect();
    print_table(rows, format);
    Ok(())
}
