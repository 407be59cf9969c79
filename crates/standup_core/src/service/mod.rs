//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into retrieval and deletion use-cases.
//! - Own continuation state for paged browsing.
//! - Keep chat/CLI layers decoupled from storage details.

pub mod cursor;
pub mod standup_service;
