//! Core logic for the standup bot.
//! This crate owns standup storage, paged retrieval and ordinal deletion.

pub mod chat;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;

pub use chat::handler::{ChatHandler, ChatSender};
pub use chat::shell::MessageAssembler;
pub use config::{ConfigError, StandupConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::standup::{
    NewStandup, StandupBody, StandupId, StandupRecord, StandupValidationError, MULTILINE_MARKER,
};
pub use reminder::{
    dispatch_reminders, ChatGateway, GatewayError, ReminderReport, ReminderSchedule,
};
pub use repo::standup_repo::{RepoError, RepoResult, SqliteStandupRepository, StandupRepository};
pub use service::standup_service::{
    DeletionCondition, DeletionOutcome, Page, PageRequest, StandupError, StandupService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
