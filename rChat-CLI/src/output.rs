//! Output formatting.

use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rchat::{Group, Message, Role, User, UserId};
use serde::Serialize;

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table format
    Table,
    /// JSON format
    Json,
    /// Plain text format
    #[default]
    Plain,
}

/// Trait for plain text output.
pub trait PlainPrint {
    /// Print as plain text with formatting.
    fn plain_print(&self);
}

/// Trait for table row generation.
pub trait TableRow {
    /// Get table headers.
    fn headers() -> Vec<&'static str>;
    /// Get row data as strings.
    fn row(&self) -> Vec<String>;
}

/// Print items in plain text format.
pub fn print_plain<T: PlainPrint>(items: &[T]) {
    if items.is_empty() {
        println!("No results");
        return;
    }
    for item in items {
        item.plain_print();
    }
}

/// Format a timestamp for display in local time.
pub fn format_time(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Format a relative time for display.
pub fn format_relative_time(timestamp: Option<DateTime<Utc>>) -> String {
    let Some(dt) = timestamp else {
        return "-".to_string();
    };

    let diff = (Utc::now() - dt).num_seconds();

    if diff < 0 {
        format_time(timestamp)
    } else if diff < 60 {
        format!("{}s ago", diff)
    } else if diff < 3600 {
        format!("{}m ago", diff / 60)
    } else if diff < 86400 {
        format!("{}h {}m ago", diff / 3600, (diff % 3600) / 60)
    } else if diff < 604800 {
        format!("{}d ago", diff / 86400)
    } else {
        format_time(timestamp)
    }
}

/// Print a table of items with proper formatting for each output mode.
pub fn print_table<T: TableRow + Serialize + PlainPrint>(items: Vec<T>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items).unwrap_or_default());
        }
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results");
                return;
            }
            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(T::headers());
            for item in &items {
                table.add_row(item.row());
            }
            println!("{table}");
        }
        OutputFormat::Plain => {
            print_plain(&items);
        }
    }
}

// ============================================================================
// Display implementations for models
// ============================================================================

/// Row for group list display.
#[derive(Serialize)]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<&Group> for GroupRow {
    fn from(g: &Group) -> Self {
        Self {
            id: g.id.to_string(),
            name: g.name.clone(),
            description: g.description.clone().unwrap_or_default(),
        }
    }
}

impl TableRow for GroupRow {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Description"]
    }
    fn row(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), self.description.clone()]
    }
}

impl PlainPrint for GroupRow {
    fn plain_print(&self) {
        println!("[{}] {}", self.id.cyan(), self.name.bold());
        if !self.description.is_empty() {
            println!("   {}", self.description.dimmed());
        }
    }
}

/// Row for user display.
#[derive(Serialize)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub network_user: String,
    pub domain: String,
    pub groups: usize,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            name: u.name.clone(),
            network_user: u.network_user.clone().unwrap_or_default(),
            domain: u.domain.clone().unwrap_or_default(),
            groups: u.groups.len(),
        }
    }
}

impl TableRow for UserRow {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "User", "Domain", "Groups"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.network_user.clone(),
            self.domain.clone(),
            self.groups.to_string(),
        ]
    }
}

impl PlainPrint for UserRow {
    fn plain_print(&self) {
        let login = match (self.network_user.is_empty(), self.domain.is_empty()) {
            (true, _) => String::new(),
            (false, true) => self.network_user.clone(),
            (false, false) => format!("{}\\{}", self.domain, self.network_user),
        };
        println!("[{}] {} {}", self.id.cyan(), self.name.bold(), login.dimmed());
    }
}

/// Row for role display.
#[derive(Serialize)]
pub struct RoleRow {
    pub id: String,
    pub name: String,
}

impl From<&Role> for RoleRow {
    fn from(r: &Role) -> Self {
        Self {
            id: r.id.to_string(),
            name: r.name.clone(),
        }
    }
}

impl TableRow for RoleRow {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name"]
    }
    fn row(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone()]
    }
}

impl PlainPrint for RoleRow {
    fn plain_print(&self) {
        println!("[{}] {}", self.id.cyan(), self.name);
    }
}

/// Row for message display.
#[derive(Serialize)]
pub struct MessageRow {
    pub id: String,
    pub from: String,
    pub from_uid: String,
    pub is_mine: bool,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl MessageRow {
    /// Build a row, marking messages written by `me`.
    pub fn new(message: &Message, me: Option<&UserId>) -> Self {
        Self {
            id: message.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
            from: message.sender_name().to_string(),
            from_uid: message
                .author_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            is_mine: me.is_some() && message.author_id.as_ref() == me,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

impl TableRow for MessageRow {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "From", "Content", "Time"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.from.clone(),
            self.content.clone(),
            format_time(self.created_at),
        ]
    }
}

impl PlainPrint for MessageRow {
    fn plain_print(&self) {
        let from_display = if self.is_mine {
            "You".green().to_string()
        } else {
            self.from.bold().to_string()
        };
        println!(
            "{} {}",
            from_display,
            format_relative_time(self.created_at).dimmed()
        );
        for line in self.content.lines() {
            if !line.trim().is_empty() {
                println!("   {}", line);
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_time_absent() {
        assert_eq!(format_time(None), "-");
        assert_eq!(format_relative_time(None), "-");
    }

    #[test]
    fn test_format_relative_time() {
        let ten_minutes_ago = Utc::now() - Duration::minutes(10);
        assert_eq!(format_relative_time(Some(ten_minutes_ago)), "10m ago");
    }

    #[test]
    fn test_message_row_marks_own_messages() {
        let me = UserId::new("1");
        let mine = Message::new("hola").with_author("1");
        let theirs = Message::new("hola").with_author("2");

        assert!(MessageRow::new(&mine, Some(&me)).is_mine);
        assert!(!MessageRow::new(&theirs, Some(&me)).is_mine);
        assert!(!MessageRow::new(&Message::new("x"), None).is_mine);
        assert_eq!(MessageRow::new(&theirs, None).from, "Unknown");
    }
}
