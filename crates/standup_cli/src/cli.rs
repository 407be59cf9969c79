//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Operator CLI for the standup update store.
#[derive(Parser, Debug)]
#[command(name = "standup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file (overrides STANDUP_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Absolute directory for rolling log files (overrides STANDUP_LOG_DIR)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (overrides STANDUP_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record an update (prefix the text with `multi:` for several lines)
    Add(AddArgs),
    /// Print one page of updates
    Page(PageArgs),
    /// Print every update of one user
    User(UserArgs),
    /// Delete a user's Nth update, or all of them
    Delete(DeleteArgs),
    /// Print updates that mention a blocker
    Blockers(OutputArgs),
    /// Print the number of stored updates
    Count,
    /// Read chat messages from stdin as one user and print replies.
    ///
    /// End a line with `\` to continue the message on the next line.
    Chat(ChatArgs),
    /// Print when the next daily reminder is due
    NextReminder,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub user: String,
    /// Display name stored with the update
    #[arg(long)]
    pub name: Option<String>,
    pub text: String,
}

#[derive(Args, Debug)]
pub struct PageArgs {
    /// Page size (defaults to STANDUP_PAGE_LIMIT, capped at 100)
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,
    /// Zero-based page index
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub page: i64,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct UserArgs {
    #[arg(long)]
    pub user: String,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[arg(long)]
    pub user: String,
    /// 1-based position in the user's own history; omit to delete all
    #[arg(allow_hyphen_values = true)]
    pub ordinal: Option<String>,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub name: Option<String>,
}
