//! Inbound message grammar.
//!
//! Recognized forms:
//! - `standup: <update>` (case-insensitive prefix; the rest may span lines)
//! - `/standup-summary [limit]`, `/standup-next [limit]`
//! - `/standup-mine`, `/standup-delete [n]`, `/standup-blockers`,
//!   `/standup-help`

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static SUBMISSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*standup:(.*)$").expect("valid submission regex"));
static COMMAND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*/standup-([a-z]+)(?:\s+(.*?))?\s*$").expect("valid command regex")
});

/// One parsed inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Raw update body following the `standup:` prefix.
    Submit(String),
    Summary { limit: Option<i64> },
    Next { limit: Option<i64> },
    Mine,
    /// `None` deletes every update of the sender.
    Delete { ordinal: Option<String> },
    Blockers,
    Help,
    /// Text that is neither a submission nor a command.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    UnknownCommand(String),
    InvalidLimit(String),
    UnexpectedArgument { command: &'static str, argument: String },
}

impl Display for CommandParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCommand(name) => write!(f, "unknown command `/standup-{name}`"),
            Self::InvalidLimit(value) => write!(f, "`{value}` is not a number"),
            Self::UnexpectedArgument { command, argument } => {
                write!(f, "`/standup-{command}` takes no argument, got `{argument}`")
            }
        }
    }
}

impl Error for CommandParseError {}

/// Parses one inbound chat message.
pub fn parse_message(text: &str) -> Result<ChatCommand, CommandParseError> {
    if let Some(captures) = SUBMISSION_RE.captures(text) {
        let body = captures.get(1).map_or("", |m| m.as_str());
        if body.trim().is_empty() {
            return Ok(ChatCommand::Unrecognized);
        }
        return Ok(ChatCommand::Submit(body.to_string()));
    }

    let Some(captures) = COMMAND_RE.captures(text) else {
        return Ok(ChatCommand::Unrecognized);
    };
    let name = captures.get(1).map_or("", |m| m.as_str());
    let argument = captures
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|value| !value.is_empty());

    match name {
        "summary" => Ok(ChatCommand::Summary {
            limit: parse_limit(argument)?,
        }),
        "next" => Ok(ChatCommand::Next {
            limit: parse_limit(argument)?,
        }),
        "delete" => Ok(ChatCommand::Delete {
            ordinal: argument.map(str::to_string),
        }),
        "mine" => no_argument("mine", argument, ChatCommand::Mine),
        "blockers" => no_argument("blockers", argument, ChatCommand::Blockers),
        "help" => Ok(ChatCommand::Help),
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

fn parse_limit(argument: Option<&str>) -> Result<Option<i64>, CommandParseError> {
    argument
        .map(|value| {
            value
                .parse::<i64>()
                .map_err(|_| CommandParseError::InvalidLimit(value.to_string()))
        })
        .transpose()
}

fn no_argument(
    command: &'static str,
    argument: Option<&str>,
    parsed: ChatCommand,
) -> Result<ChatCommand, CommandParseError> {
    match argument {
        Some(value) => Err(CommandParseError::UnexpectedArgument {
            command,
            argument: value.to_string(),
        }),
        None => Ok(parsed),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_message, ChatCommand, CommandParseError};

    #[test]
    fn submission_prefix_is_case_insensitive_and_keeps_lines() {
        assert_eq!(
            parse_message("Standup: did X").unwrap(),
            ChatCommand::Submit(" did X".to_string())
        );
        assert_eq!(
            parse_message("standup: multi:\na\nb").unwrap(),
            ChatCommand::Submit(" multi:\na\nb".to_string())
        );
    }

    #[test]
    fn empty_submission_is_unrecognized() {
        assert_eq!(parse_message("standup:   ").unwrap(), ChatCommand::Unrecognized);
        assert_eq!(parse_message("hello there").unwrap(), ChatCommand::Unrecognized);
    }

    #[test]
    fn commands_parse_optional_arguments() {
        assert_eq!(
            parse_message("/standup-summary").unwrap(),
            ChatCommand::Summary { limit: None }
        );
        assert_eq!(
            parse_message(" /standup-next 10 ").unwrap(),
            ChatCommand::Next { limit: Some(10) }
        );
        assert_eq!(
            parse_message("/standup-delete 2").unwrap(),
            ChatCommand::Delete {
                ordinal: Some("2".to_string())
            }
        );
        assert_eq!(
            parse_message("/standup-delete").unwrap(),
            ChatCommand::Delete { ordinal: None }
        );
    }

    #[test]
    fn bad_commands_are_reported() {
        assert_eq!(
            parse_message("/standup-next ten").unwrap_err(),
            CommandParseError::InvalidLimit("ten".to_string())
        );
        assert_eq!(
            parse_message("/standup-export").unwrap_err(),
            CommandParseError::UnknownCommand("export".to_string())
        );
        assert!(matches!(
            parse_message("/standup-mine please"),
            Err(CommandParseError::UnexpectedArgument { command: "mine", .. })
        ));
    }
}
