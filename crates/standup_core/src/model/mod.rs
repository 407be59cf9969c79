//! Domain model for standup updates.
//!
//! # Responsibility
//! - Define the canonical record shape stored and served by core.
//! - Own submission parsing (single line vs. multi-line marker).
//!
//! # Invariants
//! - Every stored update is identified by a stable `StandupId`.
//! - Records are never mutated after insertion.

pub mod standup;
