//! Standup repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert, count, scan and delete APIs over `standups` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Scans are ordered by `seq ASC`, the insertion order, so `LIMIT/OFFSET`
//!   paging is deterministic between writes.
//! - Argument checks run before any statement is prepared.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Records are never updated in place.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::standup::{
    NewStandup, StandupBody, StandupId, StandupRecord, StandupValidationError,
};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const STANDUP_SELECT_SQL: &str = "SELECT
    seq,
    uuid,
    user_id,
    user_name,
    body_kind,
    body_text,
    created_at
FROM standups";

const BODY_KIND_SINGLE: &str = "single";
const BODY_KIND_LINES: &str = "lines";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "standups",
        &[
            "seq",
            "uuid",
            "user_id",
            "user_name",
            "body_kind",
            "body_text",
            "created_at",
        ],
    ),
    ("standup_lines", &["standup_seq", "position", "line"]),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for standup persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Caller passed an out-of-contract argument; storage was not touched.
    InvalidArgument(String),
    Validation(StandupValidationError),
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted standup data: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StandupValidationError> for RepoError {
    fn from(value: StandupValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for standup storage.
pub trait StandupRepository {
    /// Persists one update and returns it with store-assigned fields.
    fn insert(&self, draft: &NewStandup) -> RepoResult<StandupRecord>;
    /// Total number of stored updates.
    fn count_all(&self) -> RepoResult<u64>;
    /// Up to `limit` updates starting at `offset`, insertion order.
    ///
    /// `limit >= 1` and `offset >= 0`, otherwise `RepoError::InvalidArgument`.
    fn page(&self, limit: i64, offset: i64) -> RepoResult<Vec<StandupRecord>>;
    /// All updates of one user, insertion order.
    fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<StandupRecord>>;
    /// Updates whose text contains `needle` (ASCII case-insensitive).
    fn find_containing(&self, needle: &str) -> RepoResult<Vec<StandupRecord>>;
    /// Removes one update; returns whether a row was removed.
    fn delete_by_id(&self, id: StandupId) -> RepoResult<bool>;
    /// Removes every update of one user; returns the removed count.
    fn delete_all_by_user(&self, user_id: &str) -> RepoResult<u64>;
}

/// Checks `page` arguments without touching storage.
pub fn validate_page_args(limit: i64, offset: i64) -> RepoResult<()> {
    if limit < 1 {
        return Err(RepoError::InvalidArgument(format!(
            "limit must be >= 1, got {limit}"
        )));
    }
    if offset < 0 {
        return Err(RepoError::InvalidArgument(format!(
            "offset must be >= 0, got {offset}"
        )));
    }
    Ok(())
}

/// SQLite-backed standup repository.
pub struct SqliteStandupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStandupRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema was
    ///   tampered with.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<StandupRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_standup_row(self.conn, row)?);
        }
        Ok(records)
    }
}

impl StandupRepository for SqliteStandupRepository<'_> {
    fn insert(&self, draft: &NewStandup) -> RepoResult<StandupRecord> {
        draft.validate()?;

        let id = Uuid::new_v4();
        let kind = body_kind_to_db(&draft.body);
        let body_text = draft.body.text();

        let tx = self.conn.unchecked_transaction()?;
        let (seq, created_at): (i64, i64) = tx.query_row(
            "INSERT INTO standups (
                uuid,
                user_id,
                user_name,
                body_kind,
                body_text
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING seq, created_at;",
            params![
                id.to_string(),
                draft.user_id.as_str(),
                draft.user_name.as_deref(),
                kind,
                body_text.as_str(),
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        if let StandupBody::Lines(lines) = &draft.body {
            let mut stmt = tx.prepare(
                "INSERT INTO standup_lines (standup_seq, position, line) VALUES (?1, ?2, ?3);",
            )?;
            for (position, line) in lines.iter().enumerate() {
                stmt.execute(params![seq, position as i64, line.as_str()])?;
            }
        }
        tx.commit()?;

        Ok(StandupRecord {
            id,
            seq,
            user_id: draft.user_id.clone(),
            user_name: draft.user_name.clone(),
            body: draft.body.clone(),
            created_at,
        })
    }

    fn count_all(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM standups;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn page(&self, limit: i64, offset: i64) -> RepoResult<Vec<StandupRecord>> {
        validate_page_args(limit, offset)?;
        self.query_records(
            &format!("{STANDUP_SELECT_SQL} ORDER BY seq ASC LIMIT ?1 OFFSET ?2;"),
            params![limit, offset],
        )
    }

    fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<StandupRecord>> {
        self.query_records(
            &format!("{STANDUP_SELECT_SQL} WHERE user_id = ?1 ORDER BY seq ASC;"),
            [user_id],
        )
    }

    fn find_containing(&self, needle: &str) -> RepoResult<Vec<StandupRecord>> {
        if needle.trim().is_empty() {
            return Err(RepoError::InvalidArgument(
                "search text cannot be empty".to_string(),
            ));
        }
        self.query_records(
            &format!(
                "{STANDUP_SELECT_SQL}
                 WHERE instr(lower(body_text), lower(?1)) > 0
                 ORDER BY seq ASC;"
            ),
            [needle],
        )
    }

    fn delete_by_id(&self, id: StandupId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM standups WHERE uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn delete_all_by_user(&self, user_id: &str) -> RepoResult<u64> {
        let changed = self
            .conn
            .execute("DELETE FROM standups WHERE user_id = ?1;", [user_id])?;
        Ok(changed as u64)
    }
}

fn parse_standup_row(conn: &Connection, row: &Row<'_>) -> RepoResult<StandupRecord> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in standups.uuid"))
    })?;

    let seq: i64 = row.get("seq")?;
    let kind: String = row.get("body_kind")?;
    let body = match kind.as_str() {
        BODY_KIND_SINGLE => StandupBody::Single(row.get("body_text")?),
        BODY_KIND_LINES => StandupBody::Lines(load_lines(conn, seq)?),
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid body kind `{other}` in standups.body_kind"
            )));
        }
    };
    body.validate()?;

    Ok(StandupRecord {
        id,
        seq,
        user_id: row.get("user_id")?,
        user_name: row.get("user_name")?,
        body,
        created_at: row.get("created_at")?,
    })
}

fn load_lines(conn: &Connection, seq: i64) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT line
         FROM standup_lines
         WHERE standup_seq = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([seq])?;
    let mut lines = Vec::new();
    while let Some(row) = rows.next()? {
        lines.push(row.get(0)?);
    }
    Ok(lines)
}

fn body_kind_to_db(body: &StandupBody) -> &'static str {
    match body {
        StandupBody::Single(_) => BODY_KIND_SINGLE,
        StandupBody::Lines(_) => BODY_KIND_LINES,
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    if actual_version > expected_version {
        return Err(RepoError::Db(DbError::UnsupportedSchemaVersion {
            db_version: actual_version,
            latest_supported: expected_version,
        }));
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
