use rusqlite::Connection;
use standup_core::db::open_db_in_memory;
use standup_core::repo::standup_repo::validate_page_args;
use standup_core::{
    DeletionCondition, NewStandup, PageRequest, RepoError, RepoResult, SqliteStandupRepository,
    StandupBody, StandupError, StandupId, StandupRecord, StandupRepository, StandupService,
};
use std::cell::Cell;
use std::time::Duration;

fn service(conn: &Connection) -> StandupService<SqliteStandupRepository<'_>> {
    StandupService::new(SqliteStandupRepository::try_new(conn).unwrap())
}

fn record(service: &StandupService<impl StandupRepository>, user_id: &str, text: &str) {
    service
        .record_update(user_id, None, StandupBody::single(text).unwrap())
        .unwrap()
        .expect("insert should succeed");
}

fn texts(records: &[StandupRecord]) -> Vec<String> {
    records.iter().map(StandupRecord::text).collect()
}

/// Wraps a real repository and counts every call reaching it.
struct CountingRepository<R> {
    inner: R,
    calls: Cell<usize>,
}

impl<R> CountingRepository<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
        }
    }

    fn hit(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl<R: StandupRepository> StandupRepository for CountingRepository<R> {
    fn insert(&self, draft: &NewStandup) -> RepoResult<StandupRecord> {
        self.hit();
        self.inner.insert(draft)
    }

    fn count_all(&self) -> RepoResult<u64> {
        self.hit();
        self.inner.count_all()
    }

    fn page(&self, limit: i64, offset: i64) -> RepoResult<Vec<StandupRecord>> {
        self.hit();
        self.inner.page(limit, offset)
    }

    fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<StandupRecord>> {
        self.hit();
        self.inner.find_by_user(user_id)
    }

    fn find_containing(&self, needle: &str) -> RepoResult<Vec<StandupRecord>> {
        self.hit();
        self.inner.find_containing(needle)
    }

    fn delete_by_id(&self, id: StandupId) -> RepoResult<bool> {
        self.hit();
        self.inner.delete_by_id(id)
    }

    fn delete_all_by_user(&self, user_id: &str) -> RepoResult<u64> {
        self.hit();
        self.inner.delete_all_by_user(user_id)
    }
}

/// Repository whose backend is always down.
struct UnavailableRepository;

fn unavailable<T>() -> RepoResult<T> {
    Err(RepoError::InvalidData("backend unavailable".to_string()))
}

impl StandupRepository for UnavailableRepository {
    fn insert(&self, _draft: &NewStandup) -> RepoResult<StandupRecord> {
        unavailable()
    }

    fn count_all(&self) -> RepoResult<u64> {
        unavailable()
    }

    fn page(&self, limit: i64, offset: i64) -> RepoResult<Vec<StandupRecord>> {
        validate_page_args(limit, offset)?;
        unavailable()
    }

    fn find_by_user(&self, _user_id: &str) -> RepoResult<Vec<StandupRecord>> {
        unavailable()
    }

    fn find_containing(&self, _needle: &str) -> RepoResult<Vec<StandupRecord>> {
        unavailable()
    }

    fn delete_by_id(&self, _id: StandupId) -> RepoResult<bool> {
        unavailable()
    }

    fn delete_all_by_user(&self, _user_id: &str) -> RepoResult<u64> {
        unavailable()
    }
}

/// Repository that loses the race: the snapshot sees a record the delete
/// can no longer find.
struct RacingRepository<R> {
    inner: R,
}

impl<R: StandupRepository> StandupRepository for RacingRepository<R> {
    fn insert(&self, draft: &NewStandup) -> RepoResult<StandupRecord> {
        self.inner.insert(draft)
    }

    fn count_all(&self) -> RepoResult<u64> {
        self.inner.count_all()
    }

    fn page(&self, limit: i64, offset: i64) -> RepoResult<Vec<StandupRecord>> {
        self.inner.page(limit, offset)
    }

    fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<StandupRecord>> {
        self.inner.find_by_user(user_id)
    }

    fn find_containing(&self, needle: &str) -> RepoResult<Vec<StandupRecord>> {
        self.inner.find_containing(needle)
    }

    fn delete_by_id(&self, id: StandupId) -> RepoResult<bool> {
        self.inner.delete_by_id(id)?;
        self.inner.delete_by_id(id)
    }

    fn delete_all_by_user(&self, user_id: &str) -> RepoResult<u64> {
        self.inner.delete_all_by_user(user_id)
    }
}

#[test]
fn twelve_records_page_through_with_has_more() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    for index in 0..12 {
        record(&service, "A", &format!("update {index}"));
    }

    let first = service.fetch_page(PageRequest::new(5, 0)).unwrap();
    assert_eq!(first.items.len(), 5);
    assert!(first.has_more);

    let last = service.fetch_page(PageRequest::new(5, 2)).unwrap();
    assert_eq!(texts(&last.items), vec!["update 10", "update 11"]);
    assert!(!last.has_more);

    let past_end = service.fetch_page(PageRequest::new(5, 3)).unwrap();
    assert!(past_end.items.is_empty());
    assert!(!past_end.has_more);
}

#[test]
fn fetch_page_uses_defaults_and_clamps_limit() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    for index in 0..7 {
        record(&service, "A", &format!("update {index}"));
    }

    let page = service.fetch_page(PageRequest::default()).unwrap();
    assert_eq!((page.page, page.limit, page.items.len()), (0, 5, 5));

    let clamped = service.fetch_page(PageRequest::new(1_000, 0)).unwrap();
    assert_eq!(clamped.limit, 100);
    assert_eq!(clamped.items.len(), 7);
    assert!(!clamped.has_more);
}

#[test]
fn has_more_matches_count_for_every_window() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    for index in 0..9 {
        record(&service, "A", &format!("update {index}"));
    }
    let total = service.count();

    for limit in 1..=10_i64 {
        for page in 0..=10_i64 {
            let served = service.fetch_page(PageRequest::new(limit, page)).unwrap();
            assert!(served.items.len() as i64 <= limit);
            let expected_more = total as i64 > page * limit + served.items.len() as i64;
            assert_eq!(served.has_more, expected_more, "limit={limit} page={page}");
        }
    }
}

#[test]
fn repeated_fetch_page_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    for index in 0..6 {
        record(&service, &format!("U{index}"), &format!("update {index}"));
    }

    let first = service.fetch_page(PageRequest::new(4, 1)).unwrap();
    let second = service.fetch_page(PageRequest::new(4, 1)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn invalid_page_arguments_fail_before_any_backend_call() {
    let conn = open_db_in_memory().unwrap();
    let repo = CountingRepository::new(SqliteStandupRepository::try_new(&conn).unwrap());
    let service = StandupService::new(repo);

    for request in [PageRequest::new(0, 0), PageRequest::new(5, -1)] {
        assert!(matches!(
            service.fetch_page(request),
            Err(StandupError::InvalidArgument(_))
        ));
    }
    assert!(matches!(
        service.fetch_next_page("U1", Some(0)),
        Err(StandupError::InvalidArgument(_))
    ));

    assert_eq!(service.repository().calls.get(), 0);
    assert_eq!(service.current_page("U1"), None);
}

#[test]
fn fetch_next_page_advances_cursor_by_one_per_call() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    for index in 0..12 {
        record(&service, "A", &format!("update {index}"));
    }

    let second = service.fetch_next_page("U1", Some(5)).unwrap();
    assert_eq!(service.current_page("U1"), Some(1));
    assert_eq!(second.page, 1);
    assert_eq!(texts(&second.items)[0], "update 5");
    assert!(second.has_more);

    let third = service.fetch_next_page("U1", Some(5)).unwrap();
    assert_eq!(service.current_page("U1"), Some(2));
    assert_eq!(third.items.len(), 2);
    assert!(!third.has_more);

    let beyond = service.fetch_next_page("U1", Some(5)).unwrap();
    assert_eq!(service.current_page("U1"), Some(3));
    assert!(beyond.items.is_empty());
}

#[test]
fn sessions_keep_independent_cursors() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    for index in 0..12 {
        record(&service, "A", &format!("update {index}"));
    }

    service.fetch_next_page("U1", Some(5)).unwrap();
    service.fetch_next_page("U1", Some(5)).unwrap();
    let other = service.fetch_next_page("U2", Some(5)).unwrap();

    assert_eq!(other.page, 1);
    assert_eq!(service.current_page("U1"), Some(2));
    assert_eq!(service.current_page("U2"), Some(1));

    assert!(service.reset_cursor("U1"));
    assert_eq!(service.fetch_next_page("U1", Some(5)).unwrap().page, 1);
}

#[test]
fn expired_cursor_restarts_from_first_continuation() {
    let conn = open_db_in_memory().unwrap();
    let service = StandupService::with_cursor_ttl(
        SqliteStandupRepository::try_new(&conn).unwrap(),
        Duration::from_millis(1),
    );
    service.fetch_next_page("U1", None).unwrap();
    std::thread::sleep(Duration::from_millis(5));

    assert_eq!(service.current_page("U1"), None);
    assert_eq!(service.fetch_next_page("U1", None).unwrap().page, 1);
}

#[test]
fn ordinal_deletion_removes_only_the_named_update() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    record(&service, "A", "did X");
    record(&service, "B", "someone else");
    record(&service, "A", "did Y");
    record(&service, "A", "did Z");

    let outcome = service.resolve_and_delete("A", Some("2"));
    assert_eq!(outcome.deleted_count, 1);
    assert_eq!(outcome.condition, None);

    assert_eq!(texts(&service.fetch_for_user("A")), vec!["did X", "did Z"]);
    assert_eq!(texts(&service.fetch_for_user("B")), vec!["someone else"]);
}

#[test]
fn delete_all_then_again_reports_zero() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    record(&service, "A", "one");
    record(&service, "A", "two");
    record(&service, "B", "keep");

    let first = service.resolve_and_delete("A", None);
    assert_eq!(first.deleted_count, 2);
    assert_eq!(first.condition, None);

    let second = service.resolve_and_delete("A", None);
    assert_eq!(second.deleted_count, 0);
    assert_eq!(second.condition, None);
    assert_eq!(service.count(), 1);
}

#[test]
fn out_of_range_ordinal_deletes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    for text in ["a", "b", "c"] {
        record(&service, "A", text);
    }

    let outcome = service.resolve_and_delete("A", Some("5"));
    assert_eq!(outcome.deleted_count, 0);
    assert_eq!(
        outcome.condition,
        Some(DeletionCondition::OrdinalOutOfRange {
            ordinal: 5,
            available: 3
        })
    );
    assert_eq!(service.fetch_for_user("A").len(), 3);
}

#[test]
fn malformed_ordinal_is_reported_without_backend_call() {
    let conn = open_db_in_memory().unwrap();
    let repo = CountingRepository::new(SqliteStandupRepository::try_new(&conn).unwrap());
    let service = StandupService::new(repo);

    for raw in ["abc", "NaN", "0", "-2", ""] {
        let outcome = service.resolve_and_delete("A", Some(raw));
        assert_eq!(outcome.deleted_count, 0);
        assert!(matches!(
            outcome.condition,
            Some(DeletionCondition::InvalidOrdinal(_))
        ));
    }
    assert_eq!(service.repository().calls.get(), 0);
}

#[test]
fn vanished_target_is_reported_as_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = StandupService::new(RacingRepository {
        inner: SqliteStandupRepository::try_new(&conn).unwrap(),
    });
    record(&service, "A", "did X");

    let outcome = service.resolve_and_delete("A", Some("1"));
    assert_eq!(outcome.deleted_count, 0);
    assert!(matches!(
        outcome.condition,
        Some(DeletionCondition::NotFound(_))
    ));
}

#[test]
fn storage_failures_become_safe_defaults() {
    let service = StandupService::new(UnavailableRepository);

    let inserted = service
        .record_update("A", Some("Ada"), StandupBody::single("did X").unwrap())
        .unwrap();
    assert_eq!(inserted, None);

    let page = service.fetch_page(PageRequest::new(5, 1)).unwrap();
    assert!(page.items.is_empty());
    assert!(!page.has_more);
    assert_eq!((page.page, page.limit), (1, 5));

    assert!(service.fetch_next_page("A", None).unwrap().items.is_empty());
    assert!(service.fetch_for_user("A").is_empty());
    assert!(service.fetch_blockers().is_empty());
    assert_eq!(service.count(), 0);

    for ordinal in [None, Some("1")] {
        let outcome = service.resolve_and_delete("A", ordinal);
        assert_eq!(outcome.deleted_count, 0);
        assert!(matches!(
            outcome.condition,
            Some(DeletionCondition::StorageFailure(_))
        ));
    }
}

#[test]
fn invalid_submission_is_rejected_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let repo = CountingRepository::new(SqliteStandupRepository::try_new(&conn).unwrap());
    let service = StandupService::new(repo);

    let err = service
        .record_update(" ", None, StandupBody::Single("x".to_string()))
        .unwrap_err();
    assert!(matches!(err, StandupError::InvalidArgument(_)));
    assert_eq!(service.repository().calls.get(), 0);
}

#[test]
fn blockers_report_filters_by_keyword() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    record(&service, "A", "Blocker: CI is red");
    record(&service, "B", "all good");
    record(&service, "C", "no blockers");

    let users: Vec<String> = service
        .fetch_blockers()
        .into_iter()
        .map(|record| record.user_id)
        .collect();
    assert_eq!(users, vec!["A", "C"]);
}
