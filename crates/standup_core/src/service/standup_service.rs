//! Standup retrieval and deletion use-cases.
//!
//! # Responsibility
//! - Serve bounded pages, per-session continuation pages, per-user history
//!   and the blockers report.
//! - Resolve user-facing ordinals ("my 2nd update") into deletions.
//! - Convert storage failures into safe defaults so one bad request never
//!   breaks a caller's response cycle.
//!
//! # Invariants
//! - Bad `limit`/`page` fail with `InvalidArgument` before any repository
//!   call.
//! - `limit` is clamped to `MAX_PAGE_LIMIT`, never rejected for size.
//! - Ordinal deletion is best effort: the snapshot and the delete are two
//!   separate statements, so a concurrent write between them may shift
//!   which update an ordinal names.

use crate::model::standup::{
    NewStandup, StandupBody, StandupId, StandupRecord, StandupValidationError,
};
use crate::repo::standup_repo::{RepoError, StandupRepository};
use crate::service::cursor::SessionCursors;
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_PAGE_LIMIT: i64 = 5;
pub const MAX_PAGE_LIMIT: i64 = 100;
/// Keyword that marks an update as reporting a blocker.
pub const BLOCKER_KEYWORD: &str = "blocker";

/// Service error for standup use-cases.
#[derive(Debug)]
pub enum StandupError {
    /// Bad caller input; nothing was read or written.
    InvalidArgument(String),
    /// Target update vanished before it could be removed.
    NotFound(StandupId),
    /// Persistence-layer failure.
    Storage(RepoError),
}

impl Display for StandupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NotFound(id) => write!(f, "standup update not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StandupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StandupError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidArgument(message) => Self::InvalidArgument(message),
            RepoError::Validation(err) => Self::InvalidArgument(err.to_string()),
            other => Self::Storage(other),
        }
    }
}

impl From<StandupValidationError> for StandupError {
    fn from(value: StandupValidationError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

/// Page request; `None` fields take the defaults (limit 5, page 0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl PageRequest {
    pub fn new(limit: i64, page: i64) -> Self {
        Self {
            limit: Some(limit),
            page: Some(page),
        }
    }
}

/// One bounded batch of updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Updates in insertion order.
    pub items: Vec<StandupRecord>,
    /// Whether more updates exist past this page at query time.
    pub has_more: bool,
    /// Zero-based page index served.
    pub page: i64,
    /// Effective limit after clamping.
    pub limit: i64,
}

impl Page {
    fn empty(window: PageWindow) -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            page: window.page,
            limit: window.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageWindow {
    limit: i64,
    page: i64,
    offset: i64,
}

impl PageWindow {
    fn from_request(request: PageRequest) -> Result<Self, StandupError> {
        let limit = request.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit < 1 {
            return Err(StandupError::InvalidArgument(format!(
                "limit must be >= 1, got {limit}"
            )));
        }
        let limit = limit.min(MAX_PAGE_LIMIT);

        let page = request.page.unwrap_or(0);
        if page < 0 {
            return Err(StandupError::InvalidArgument(format!(
                "page must be >= 0, got {page}"
            )));
        }

        let offset = page
            .checked_mul(limit)
            .filter(|offset| offset.checked_add(limit).is_some())
            .ok_or_else(|| StandupError::InvalidArgument(format!("page {page} is out of range")))?;

        Ok(Self {
            limit,
            page,
            offset,
        })
    }
}

/// Why a deletion request removed nothing (or less than asked).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionCondition {
    /// Ordinal was not a positive integer; carries the raw input.
    InvalidOrdinal(String),
    /// Ordinal points past the user's history.
    OrdinalOutOfRange { ordinal: usize, available: usize },
    /// The resolved update disappeared before the delete ran.
    NotFound(StandupId),
    /// Backend failure; details were logged.
    StorageFailure(String),
}

impl Display for DeletionCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOrdinal(raw) => {
                write!(f, "`{raw}` is not a valid update number; use 1, 2, 3...")
            }
            Self::OrdinalOutOfRange { ordinal, available } => write!(
                f,
                "update #{ordinal} does not exist; you have {available} update(s)"
            ),
            Self::NotFound(_) => write!(f, "that update was already removed"),
            Self::StorageFailure(_) => write!(f, "updates could not be deleted right now"),
        }
    }
}

/// Result of `resolve_and_delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub deleted_count: u64,
    pub condition: Option<DeletionCondition>,
}

impl DeletionOutcome {
    fn deleted(count: u64) -> Self {
        Self {
            deleted_count: count,
            condition: None,
        }
    }

    fn nothing(condition: DeletionCondition) -> Self {
        Self {
            deleted_count: 0,
            condition: Some(condition),
        }
    }
}

/// Parses a user-facing 1-based ordinal.
pub fn parse_ordinal(raw: &str) -> Result<usize, DeletionCondition> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(value) if value >= 1 => usize::try_from(value)
            .map_err(|_| DeletionCondition::InvalidOrdinal(trimmed.to_string())),
        _ => Err(DeletionCondition::InvalidOrdinal(trimmed.to_string())),
    }
}

/// Retrieval façade and deletion resolver over a repository.
pub struct StandupService<R: StandupRepository> {
    repo: R,
    cursors: SessionCursors,
}

impl<R: StandupRepository> StandupService<R> {
    /// Creates a service with the default cursor TTL.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            cursors: SessionCursors::default(),
        }
    }

    /// Creates a service whose idle session cursors expire after `ttl`.
    pub fn with_cursor_ttl(repo: R, ttl: Duration) -> Self {
        Self {
            repo,
            cursors: SessionCursors::new(ttl),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Stores one update.
    ///
    /// # Contract
    /// - Invalid input returns `InvalidArgument` without touching storage.
    /// - Storage failure is logged and returns `Ok(None)`; the caller's flow
    ///   continues and the update is simply not visible to later reads.
    pub fn record_update(
        &self,
        user_id: &str,
        user_name: Option<&str>,
        body: StandupBody,
    ) -> Result<Option<StandupRecord>, StandupError> {
        let draft = NewStandup::new(user_id, body)?.with_user_name(user_name);
        match self.repo.insert(&draft) {
            Ok(record) => {
                info!(
                    "event=standup_insert module=service status=ok user_id={} seq={} multiline={}",
                    record.user_id,
                    record.seq,
                    record.body.is_multiline()
                );
                Ok(Some(record))
            }
            Err(err) => {
                error!(
                    "event=standup_insert module=service status=error user_id={} error={}",
                    draft.user_id, err
                );
                Ok(None)
            }
        }
    }

    /// Serves one page.
    ///
    /// `has_more` is `count_all() > page * limit + limit` at query time.
    /// Storage failures produce an empty page with `has_more = false`.
    pub fn fetch_page(&self, request: PageRequest) -> Result<Page, StandupError> {
        let window = PageWindow::from_request(request)?;
        match self.load_window(window) {
            Ok(page) => Ok(page),
            Err(err) => {
                error!(
                    "event=standup_page module=service status=error page={} limit={} error={}",
                    window.page, window.limit, err
                );
                Ok(Page::empty(window))
            }
        }
    }

    /// Advances `session`'s cursor by one and serves that page.
    ///
    /// The first call for a fresh session serves page 1, continuing after a
    /// `fetch_page` of page 0. `limit` is validated before the cursor moves.
    pub fn fetch_next_page(
        &self,
        session: &str,
        limit: Option<i64>,
    ) -> Result<Page, StandupError> {
        if session.trim().is_empty() {
            return Err(StandupError::InvalidArgument(
                "session key cannot be empty".to_string(),
            ));
        }
        PageWindow::from_request(PageRequest { limit, page: None })?;

        let page = self.cursors.advance(session);
        self.fetch_page(PageRequest {
            limit,
            page: Some(i64::from(page)),
        })
    }

    /// Forgets `session`'s cursor so the next continuation starts over.
    pub fn reset_cursor(&self, session: &str) -> bool {
        self.cursors.reset(session)
    }

    /// Last page served to `session` by `fetch_next_page`, if still live.
    pub fn current_page(&self, session: &str) -> Option<u32> {
        self.cursors.current(session)
    }

    /// All updates of `user_id` in insertion order; empty on failure.
    pub fn fetch_for_user(&self, user_id: &str) -> Vec<StandupRecord> {
        self.repo.find_by_user(user_id).unwrap_or_else(|err| {
            error!(
                "event=standup_user_fetch module=service status=error user_id={} error={}",
                user_id, err
            );
            Vec::new()
        })
    }

    /// Updates mentioning a blocker, insertion order; empty on failure.
    pub fn fetch_blockers(&self) -> Vec<StandupRecord> {
        self.repo
            .find_containing(BLOCKER_KEYWORD)
            .unwrap_or_else(|err| {
                error!("event=standup_blockers module=service status=error error={err}");
                Vec::new()
            })
    }

    /// Total stored updates; 0 on failure.
    pub fn count(&self) -> u64 {
        self.repo.count_all().unwrap_or_else(|err| {
            error!("event=standup_count module=service status=error error={err}");
            0
        })
    }

    /// Deletes one of `user_id`'s updates by 1-based ordinal, or all of them
    /// when `ordinal` is `None`.
    ///
    /// Never fails: bad input and storage errors come back as a
    /// `DeletionCondition` with `deleted_count = 0`.
    pub fn resolve_and_delete(&self, user_id: &str, ordinal: Option<&str>) -> DeletionOutcome {
        let outcome = match ordinal {
            None => self.delete_all(user_id),
            Some(raw) => match parse_ordinal(raw) {
                Ok(ordinal) => self.delete_nth(user_id, ordinal),
                Err(condition) => DeletionOutcome::nothing(condition),
            },
        };

        match &outcome.condition {
            None => info!(
                "event=standup_delete module=service status=ok user_id={} deleted={}",
                user_id, outcome.deleted_count
            ),
            Some(condition) => warn!(
                "event=standup_delete module=service status=skipped user_id={} reason={:?}",
                user_id, condition
            ),
        }
        outcome
    }

    fn load_window(&self, window: PageWindow) -> Result<Page, StandupError> {
        let items = self.repo.page(window.limit, window.offset)?;
        let total = self.repo.count_all()?;
        let served_through = u64::try_from(window.offset + window.limit).unwrap_or(u64::MAX);

        Ok(Page {
            items,
            has_more: total > served_through,
            page: window.page,
            limit: window.limit,
        })
    }

    fn delete_all(&self, user_id: &str) -> DeletionOutcome {
        match self.repo.delete_all_by_user(user_id) {
            Ok(count) => DeletionOutcome::deleted(count),
            Err(err) => {
                error!(
                    "event=standup_delete module=service status=error user_id={} error={}",
                    user_id, err
                );
                DeletionOutcome::nothing(DeletionCondition::StorageFailure(err.to_string()))
            }
        }
    }

    fn delete_nth(&self, user_id: &str, ordinal: usize) -> DeletionOutcome {
        match self.try_delete_nth(user_id, ordinal) {
            Ok(outcome) => outcome,
            Err(StandupError::NotFound(id)) => {
                DeletionOutcome::nothing(DeletionCondition::NotFound(id))
            }
            Err(err) => {
                error!(
                    "event=standup_delete module=service status=error user_id={} ordinal={} error={}",
                    user_id, ordinal, err
                );
                DeletionOutcome::nothing(DeletionCondition::StorageFailure(err.to_string()))
            }
        }
    }

    fn try_delete_nth(
        &self,
        user_id: &str,
        ordinal: usize,
    ) -> Result<DeletionOutcome, StandupError> {
        let snapshot = self.repo.find_by_user(user_id)?;
        let Some(target) = snapshot.get(ordinal - 1) else {
            return Ok(DeletionOutcome::nothing(DeletionCondition::OrdinalOutOfRange {
                ordinal,
                available: snapshot.len(),
            }));
        };

        if !self.repo.delete_by_id(target.id)? {
            return Err(StandupError::NotFound(target.id));
        }
        Ok(DeletionOutcome::deleted(1))
    }
}
