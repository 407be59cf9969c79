//! Standup update domain model.
//!
//! # Responsibility
//! - Define the persisted record and the draft accepted by the repository.
//! - Parse raw submission text into a structured body.
//!
//! # Invariants
//! - `id` is stable and never reused for another update.
//! - `user_id` is never blank.
//! - A `Lines` body holds at least one line and no line contains a line break.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one stored update.
pub type StandupId = Uuid;

/// Prefix that flags a submission as a multi-line block.
///
/// Matched case-insensitively after trimming leading whitespace.
pub const MULTILINE_MARKER: &str = "multi:";

/// Validation error for standup drafts and bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandupValidationError {
    EmptyUserId,
    EmptyBody,
    EmptyLine { index: usize },
    LineContainsBreak { index: usize },
}

impl Display for StandupValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUserId => write!(f, "user id cannot be empty"),
            Self::EmptyBody => write!(f, "standup update cannot be empty"),
            Self::EmptyLine { index } => write!(f, "line {index} of the update is empty"),
            Self::LineContainsBreak { index } => {
                write!(f, "line {index} of the update contains a line break")
            }
        }
    }
}

impl Error for StandupValidationError {}

/// Content of one update.
///
/// Multi-line updates keep their lines as an ordered list instead of an
/// inline encoding, so content containing delimiters stays unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StandupBody {
    /// Free text as submitted (trimmed).
    Single(String),
    /// Ordered lines of a multi-line submission.
    Lines(Vec<String>),
}

impl StandupBody {
    /// Builds a single-text body, trimming surrounding whitespace.
    pub fn single(text: impl Into<String>) -> Result<Self, StandupValidationError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(StandupValidationError::EmptyBody);
        }
        Ok(Self::Single(trimmed.to_string()))
    }

    /// Builds a multi-line body from already split lines.
    ///
    /// Lines are kept verbatim; use [`StandupBody::parse_submission`] for raw
    /// user input.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, StandupValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let body = Self::Lines(lines.into_iter().map(Into::into).collect());
        body.validate()?;
        Ok(body)
    }

    /// Parses raw submission text.
    ///
    /// Text starting with [`MULTILINE_MARKER`] is split on line breaks; each
    /// line is trimmed and blank lines are dropped. Anything else becomes a
    /// `Single` body.
    pub fn parse_submission(raw: &str) -> Result<Self, StandupValidationError> {
        let trimmed = raw.trim();
        let has_marker = trimmed
            .get(..MULTILINE_MARKER.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MULTILINE_MARKER));

        if !has_marker {
            return Self::single(trimmed);
        }

        let lines: Vec<String> = trimmed[MULTILINE_MARKER.len()..]
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self::from_lines(lines)
    }

    /// Checks body invariants.
    pub fn validate(&self) -> Result<(), StandupValidationError> {
        match self {
            Self::Single(text) => {
                if text.trim().is_empty() {
                    return Err(StandupValidationError::EmptyBody);
                }
            }
            Self::Lines(lines) => {
                if lines.is_empty() {
                    return Err(StandupValidationError::EmptyBody);
                }
                for (index, line) in lines.iter().enumerate() {
                    if line.contains(['\n', '\r']) {
                        return Err(StandupValidationError::LineContainsBreak { index });
                    }
                    if line.trim().is_empty() {
                        return Err(StandupValidationError::EmptyLine { index });
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the display lines of this body.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Self::Single(text) => text.lines().collect(),
            Self::Lines(lines) => lines.iter().map(String::as_str).collect(),
        }
    }

    /// Returns the body as one newline-joined string.
    pub fn text(&self) -> String {
        match self {
            Self::Single(text) => text.clone(),
            Self::Lines(lines) => lines.join("\n"),
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, Self::Lines(_))
    }
}

/// Insert request accepted by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStandup {
    pub user_id: String,
    /// Display name at submission time. Not kept in sync afterwards.
    pub user_name: Option<String>,
    pub body: StandupBody,
}

impl NewStandup {
    /// Creates a validated draft for `user_id`.
    pub fn new(
        user_id: impl Into<String>,
        body: StandupBody,
    ) -> Result<Self, StandupValidationError> {
        let draft = Self {
            user_id: user_id.into().trim().to_string(),
            user_name: None,
            body,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Attaches a display name; blank names are dropped.
    pub fn with_user_name(mut self, user_name: Option<&str>) -> Self {
        self.user_name = user_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        self
    }

    pub fn validate(&self) -> Result<(), StandupValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(StandupValidationError::EmptyUserId);
        }
        self.body.validate()
    }
}

/// Persisted standup update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandupRecord {
    /// Stable store-assigned identifier.
    pub id: StandupId,
    /// Monotonic insertion sequence; defines scan order.
    pub seq: i64,
    pub user_id: String,
    pub user_name: Option<String>,
    pub body: StandupBody,
    /// Unix epoch milliseconds, assigned by the store.
    pub created_at: i64,
}

impl StandupRecord {
    /// Convenience for the newline-joined body text.
    pub fn text(&self) -> String {
        self.body.text()
    }
}

#[cfg(test)]
mod tests {
    use super::{NewStandup, StandupBody, StandupValidationError};

    #[test]
    fn parse_submission_without_marker_is_single() {
        let body = StandupBody::parse_submission("  shipped the importer  ").unwrap();
        assert_eq!(body, StandupBody::Single("shipped the importer".to_string()));
        assert!(!body.is_multiline());
    }

    #[test]
    fn parse_submission_with_marker_splits_lines() {
        let body =
            StandupBody::parse_submission("MULTI:\n- fixed login, finally\n\n  - reviewed PRs \n")
                .unwrap();
        assert_eq!(
            body,
            StandupBody::Lines(vec![
                "- fixed login, finally".to_string(),
                "- reviewed PRs".to_string()
            ])
        );
        assert_eq!(body.text(), "- fixed login, finally\n- reviewed PRs");
    }

    #[test]
    fn parse_submission_rejects_empty_content() {
        assert_eq!(
            StandupBody::parse_submission("   ").unwrap_err(),
            StandupValidationError::EmptyBody
        );
        assert_eq!(
            StandupBody::parse_submission("multi:\n \n").unwrap_err(),
            StandupValidationError::EmptyBody
        );
    }

    #[test]
    fn from_lines_rejects_embedded_breaks() {
        let err = StandupBody::from_lines(["ok", "bad\nline"]).unwrap_err();
        assert_eq!(err, StandupValidationError::LineContainsBreak { index: 1 });
    }

    #[test]
    fn draft_requires_user_id_and_drops_blank_name() {
        let body = StandupBody::single("did X").unwrap();
        assert_eq!(
            NewStandup::new("  ", body.clone()).unwrap_err(),
            StandupValidationError::EmptyUserId
        );

        let draft = NewStandup::new("U1", body).unwrap().with_user_name(Some("  "));
        assert_eq!(draft.user_name, None);
    }
}
