//! Plain-text reply handler for inbound chat messages.

use crate::chat::command::{parse_message, ChatCommand};
use crate::model::standup::{StandupBody, StandupRecord};
use crate::repo::standup_repo::StandupRepository;
use crate::service::standup_service::{Page, PageRequest, StandupService, DEFAULT_PAGE_LIMIT};

pub const FORMAT_HINT: &str = "Please use the format: `standup: <your update>`.";

pub const HELP_TEXT: &str = "Standup commands:
standup: <update>          record an update (start with `multi:`, one item per line)
/standup-summary [limit]   first page of all updates
/standup-next [limit]      continue where your last page ended
/standup-mine              your own updates, numbered
/standup-delete [n]        delete your update #n, or all of them
/standup-blockers          updates that mention a blocker";

/// Identity of the message author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSender {
    pub user_id: String,
    pub user_name: Option<String>,
}

impl ChatSender {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: None,
        }
    }

    pub fn with_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }
}

/// Routes parsed messages to the service and renders replies.
pub struct ChatHandler<'svc, R: StandupRepository> {
    service: &'svc StandupService<R>,
    default_limit: i64,
}

impl<'svc, R: StandupRepository> ChatHandler<'svc, R> {
    pub fn new(service: &'svc StandupService<R>) -> Self {
        Self {
            service,
            default_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Page size used when a summary/next command carries no limit.
    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    fn page_limit(&self, requested: Option<i64>) -> Option<i64> {
        Some(requested.unwrap_or(self.default_limit))
    }

    /// Handles one inbound message and returns the reply text.
    pub fn handle(&self, sender: &ChatSender, text: &str) -> String {
        let command = match parse_message(text) {
            Ok(command) => command,
            Err(err) => return format!("{err}. Send /standup-help for usage."),
        };

        match command {
            ChatCommand::Submit(raw) => self.submit(sender, &raw),
            ChatCommand::Summary { limit } => {
                // A summary restarts the sender's continuation.
                self.service.reset_cursor(&sender.user_id);
                let request = PageRequest {
                    limit: self.page_limit(limit),
                    page: None,
                };
                match self.service.fetch_page(request) {
                    Ok(page) => render_page("Daily Standup Summary", &page),
                    Err(err) => format!("Could not list updates: {err}"),
                }
            }
            ChatCommand::Next { limit } => {
                let limit = self.page_limit(limit);
                match self.service.fetch_next_page(&sender.user_id, limit) {
                    Ok(page) => render_page("More Standup Updates", &page),
                    Err(err) => format!("Could not list updates: {err}"),
                }
            }
            ChatCommand::Mine => render_own_history(&self.service.fetch_for_user(&sender.user_id)),
            ChatCommand::Delete { ordinal } => {
                let outcome = self
                    .service
                    .resolve_and_delete(&sender.user_id, ordinal.as_deref());
                match outcome.condition {
                    Some(condition) => format!("Nothing deleted: {condition}."),
                    None => format!("Deleted {} update(s).", outcome.deleted_count),
                }
            }
            ChatCommand::Blockers => render_blockers(&self.service.fetch_blockers()),
            ChatCommand::Help => HELP_TEXT.to_string(),
            ChatCommand::Unrecognized => FORMAT_HINT.to_string(),
        }
    }

    fn submit(&self, sender: &ChatSender, raw: &str) -> String {
        let body = match StandupBody::parse_submission(raw) {
            Ok(body) => body,
            Err(err) => return format!("Could not record update: {err}."),
        };
        match self
            .service
            .record_update(&sender.user_id, sender.user_name.as_deref(), body)
        {
            Ok(Some(_)) => format!(
                "<@{}>, your standup update has been recorded!",
                sender.user_id
            ),
            Ok(None) => "Sorry, your update could not be saved right now.".to_string(),
            Err(err) => format!("Could not record update: {err}."),
        }
    }
}

/// Renders one record as `- <@user>: text`, extra lines indented.
pub fn render_record(record: &StandupRecord) -> String {
    let mut lines = record.body.lines().into_iter();
    let mut rendered = format!("- <@{}>: {}", record.user_id, lines.next().unwrap_or(""));
    for line in lines {
        rendered.push_str("\n    ");
        rendered.push_str(line);
    }
    rendered
}

fn render_page(title: &str, page: &Page) -> String {
    if page.items.is_empty() {
        return if page.page == 0 {
            "No updates have been recorded yet.".to_string()
        } else {
            "No more updates.".to_string()
        };
    }

    let mut reply = format!("*{title}* (page {})\n", page.page + 1);
    for record in &page.items {
        reply.push_str(&render_record(record));
        reply.push('\n');
    }
    if page.has_more {
        reply.push_str("Send /standup-next for more.");
    }
    reply.trim_end().to_string()
}

fn render_own_history(records: &[StandupRecord]) -> String {
    if records.is_empty() {
        return "You have not recorded any updates yet.".to_string();
    }

    let mut reply = String::from("*Your updates:*");
    for (index, record) in records.iter().enumerate() {
        reply.push_str(&format!("\n{}. {}", index + 1, record.body.lines().join(" / ")));
    }
    reply
}

fn render_blockers(records: &[StandupRecord]) -> String {
    if records.is_empty() {
        return "No blockers have been reported.".to_string();
    }

    let rendered: Vec<String> = records.iter().map(render_record).collect();
    format!("*Blockers Reported:*\n{}", rendered.join("\n"))
}
