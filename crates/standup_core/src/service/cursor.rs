//! Session-scoped pagination cursors.
//!
//! # Responsibility
//! - Track "next page to serve" per requester so continuation requests from
//!   different sessions never advance each other's position.
//! - Forget idle sessions after a TTL.
//!
//! # Invariants
//! - A new or expired session starts at page 0.
//! - `advance` increases a live session's page by exactly one.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Idle time after which a session cursor is discarded.
pub const DEFAULT_CURSOR_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy)]
struct CursorEntry {
    current_page: u32,
    touched_at: Instant,
}

/// Short-lived cursor map keyed by session identity.
#[derive(Debug)]
pub struct SessionCursors {
    ttl: Duration,
    entries: Mutex<HashMap<String, CursorEntry>>,
}

impl Default for SessionCursors {
    fn default() -> Self {
        Self::new(DEFAULT_CURSOR_TTL)
    }
}

impl SessionCursors {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Advances `session` by one page and returns the page to serve.
    pub fn advance(&self, session: &str) -> u32 {
        self.advance_at(session, Instant::now())
    }

    /// Returns the last page served to `session`, if the session is live.
    pub fn current(&self, session: &str) -> Option<u32> {
        self.current_at(session, Instant::now())
    }

    /// Drops the cursor for `session`. Returns whether one existed.
    pub fn reset(&self, session: &str) -> bool {
        self.entries.lock().remove(session).is_some()
    }

    /// Number of sessions currently holding a cursor (expired ones included
    /// until the next advance sweeps them).
    pub fn tracked_sessions(&self) -> usize {
        self.entries.lock().len()
    }

    fn advance_at(&self, session: &str, now: Instant) -> u32 {
        let ttl = self.ttl;
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !is_expired(entry, now, ttl));

        let entry = entries.entry(session.to_string()).or_insert(CursorEntry {
            current_page: 0,
            touched_at: now,
        });
        entry.current_page = entry.current_page.saturating_add(1);
        entry.touched_at = now;
        entry.current_page
    }

    fn current_at(&self, session: &str, now: Instant) -> Option<u32> {
        self.entries
            .lock()
            .get(session)
            .filter(|entry| !is_expired(entry, now, self.ttl))
            .map(|entry| entry.current_page)
    }
}

fn is_expired(entry: &CursorEntry, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(entry.touched_at) >= ttl
}

#[cfg(test)]
mod tests {
    use super::SessionCursors;
    use std::time::{Duration, Instant};

    #[test]
    fn advance_increments_by_one_per_call() {
        let cursors = SessionCursors::default();
        assert_eq!(cursors.current("U1"), None);
        assert_eq!(cursors.advance("U1"), 1);
        assert_eq!(cursors.advance("U1"), 2);
        assert_eq!(cursors.current("U1"), Some(2));
    }

    #[test]
    fn sessions_are_isolated() {
        let cursors = SessionCursors::default();
        cursors.advance("U1");
        cursors.advance("U1");
        assert_eq!(cursors.advance("U2"), 1);
        assert_eq!(cursors.current("U1"), Some(2));
    }

    #[test]
    fn reset_restarts_session() {
        let cursors = SessionCursors::default();
        cursors.advance("U1");
        assert!(cursors.reset("U1"));
        assert!(!cursors.reset("U1"));
        assert_eq!(cursors.advance("U1"), 1);
    }

    #[test]
    fn idle_sessions_expire_and_are_swept() {
        let cursors = SessionCursors::new(Duration::from_secs(60));
        let start = Instant::now();
        cursors.advance_at("U1", start);
        cursors.advance_at("U1", start);

        let later = start + Duration::from_secs(61);
        assert_eq!(cursors.current_at("U1", later), None);
        assert_eq!(cursors.advance_at("U2", later), 1);
        assert_eq!(cursors.tracked_sessions(), 1);
        assert_eq!(cursors.advance_at("U1", later), 1);
    }
}
