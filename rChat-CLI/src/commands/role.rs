//! Role commands.

use anyhow::Result;
use clap::Subcommand;

use crate::config::build_client;
use crate::output::{print_table, OutputFormat, RoleRow};

#[derive(Subcommand)]
pub enum RoleAction {
    /// List roles available at registration
    #[command(alias = "ls")]
    List,
}

pub async fn handle(action: RoleAction, format: OutputFormat, base_url: Option<&str>) -> Result<()> {
    match action {
        RoleAction::List => {
            let client = build_client(base_url).await?;
            let roles = client.roles().list().await?;

            let rows: Vec<RoleRow> = roles.iter().map(RoleRow::from).collect();
            print_table(rows, format);
            Ok(())
        }
    }
}
