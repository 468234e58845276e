#![deny(missing_docs)]
//! Guide bot core library.
//!
//! Transport-agnostic logic: JSON-file repositories, conversation sessions,
//! admin authorization and the admin flow coordinator.

/// Admin authorization and notifications.
pub mod admin;
/// Configuration management.
pub mod config;
/// Add/delete guide flows.
pub mod flow;
/// Conversation sessions.
pub mod session;
/// Storage layer (JSON files).
pub mod storage;
/// Utility functions.
pub mod utils;

#[cfg(test)]
pub mod testing;
