//! Chat-facing glue around the standup service.
//!
//! # Responsibility
//! - Parse inbound chat text into typed commands.
//! - Turn service results into plain-text replies.
//! - Assemble continued terminal lines into whole messages.
//!
//! # Invariants
//! - The continuation cursor is keyed by the sender's user id.
//! - Handlers never fail; every message gets a reply.

pub mod command;
pub mod handler;
pub mod shell;
