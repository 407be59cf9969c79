//! Daily standup reminder planning and dispatch.
//!
//! # Responsibility
//! - Compute when the next daily reminder is due.
//! - Send the standup prompt to every human member of a channel through a
//!   caller-provided chat gateway.
//!
//! # Invariants
//! - The system bot account never receives reminders.
//! - One failed recipient does not stop delivery to the rest.
//! - Delivery is at most once per dispatch call; there is no retry.
//!
//! This crate ships no concrete gateway. A host process that owns a chat
//! connection implements [`ChatGateway`] and calls [`dispatch_reminders`]
//! with `StandupConfig::channel_id` at each `ReminderSchedule` fire time.

use chrono::{DateTime, Days, NaiveTime, TimeZone};
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Message posted to each recipient.
pub const REMINDER_PROMPT: &str = "Good morning! Please share your daily standup update:
1. What did you do yesterday?
2. What are you working on today?
3. Any blockers?";

/// Built-in bot account present in every channel member list.
pub const SYSTEM_BOT_USER_ID: &str = "USLACKBOT";

/// Chat platform operations needed for reminders.
pub trait ChatGateway {
    /// Returns the user ids of a channel's members.
    fn channel_members(&self, channel_id: &str) -> Result<Vec<String>, GatewayError>;
    /// Sends a direct message to one user.
    fn post_message(&self, user_id: &str, text: &str) -> Result<(), GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Platform could not be reached.
    Unavailable(String),
    /// Platform refused the request for `target`.
    Rejected { target: String, message: String },
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "chat platform unavailable: {message}"),
            Self::Rejected { target, message } => {
                write!(f, "chat platform rejected request for `{target}`: {message}")
            }
        }
    }
}

impl Error for GatewayError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderScheduleError {
    InvalidTime(String),
}

impl Display for ReminderScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTime(value) => {
                write!(f, "invalid reminder time `{value}`; expected HH:MM")
            }
        }
    }
}

impl Error for ReminderScheduleError {}

/// Daily wall-clock time at which reminders fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderSchedule {
    at: NaiveTime,
}

impl Default for ReminderSchedule {
    /// 09:00 every day.
    fn default() -> Self {
        Self {
            at: NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time"),
        }
    }
}

impl ReminderSchedule {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ReminderScheduleError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|at| Self { at })
            .ok_or_else(|| ReminderScheduleError::InvalidTime(format!("{hour}:{minute}")))
    }

    /// Parses `HH:MM` (24-hour clock).
    pub fn parse(value: &str) -> Result<Self, ReminderScheduleError> {
        let trimmed = value.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .map(|at| Self { at })
            .map_err(|_| ReminderScheduleError::InvalidTime(trimmed.to_string()))
    }

    pub fn time(&self) -> NaiveTime {
        self.at
    }

    /// First fire time strictly after `now`, in `now`'s time zone.
    ///
    /// A fire time skipped by a DST gap moves to the next day.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let today = now.date_naive();
        for offset in 0..=2 {
            let Some(date) = today.checked_add_days(Days::new(offset)) else {
                break;
            };
            if let Some(candidate) = tz.from_local_datetime(&date.and_time(self.at)).earliest() {
                if candidate > *now {
                    return candidate;
                }
            }
        }
        now.clone() + chrono::Duration::days(1)
    }
}

impl Display for ReminderSchedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.at.format("%H:%M"))
    }
}

/// Delivery summary of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub sent: Vec<String>,
    pub failed: Vec<(String, GatewayError)>,
}

/// Filters a member list down to reminder recipients.
///
/// Drops the system bot and blank ids, removes duplicates, keeps order.
pub fn reminder_recipients(members: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    members
        .into_iter()
        .map(|member| member.trim().to_string())
        .filter(|member| !member.is_empty() && member != SYSTEM_BOT_USER_ID)
        .filter(|member| seen.insert(member.clone()))
        .collect()
}

/// Posts [`REMINDER_PROMPT`] to every human member of `channel_id`.
///
/// # Errors
/// - Returns the gateway error when the member list cannot be fetched.
///   Per-recipient failures are collected in the report instead.
pub fn dispatch_reminders<G: ChatGateway + ?Sized>(
    gateway: &G,
    channel_id: &str,
) -> Result<ReminderReport, GatewayError> {
    let members = gateway.channel_members(channel_id).map_err(|err| {
        error!(
            "event=reminder_dispatch module=reminder status=error channel_id={} error={}",
            channel_id, err
        );
        err
    })?;

    let mut report = ReminderReport::default();
    for user_id in reminder_recipients(members) {
        match gateway.post_message(&user_id, REMINDER_PROMPT) {
            Ok(()) => report.sent.push(user_id),
            Err(err) => {
                warn!(
                    "event=reminder_send module=reminder status=error user_id={} error={}",
                    user_id, err
                );
                report.failed.push((user_id, err));
            }
        }
    }

    info!(
        "event=reminder_dispatch module=reminder status=ok channel_id={} sent={} failed={}",
        channel_id,
        report.sent.len(),
        report.failed.len()
    );
    Ok(report)
}
