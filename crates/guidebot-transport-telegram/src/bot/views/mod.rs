//! View layer for bot UI components
//!
//! Contains keyboards, messages, and formatting for Telegram UI.

pub mod admin;
pub mod guides;

pub use admin::*;
pub use guides::*;
