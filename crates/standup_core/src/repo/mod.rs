//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `NewStandup::validate()` before persistence.
//! - Every scan is ordered by insertion sequence.

pub mod standup_repo;
