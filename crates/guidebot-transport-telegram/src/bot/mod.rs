/// Admin command handlers
pub mod admin_handlers;
/// `/check_channel` parsing and reporting
pub mod channel_audit;
/// User-facing command, callback and message handlers
pub mod handlers;
/// Banner media shown above the guide menu
pub mod menu_media;
/// Common messaging utilities (flow replies, long listings)
pub mod messaging;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// Shared handler dependencies
pub mod services;
/// Channel subscription gate
pub mod subscription;
/// View layer for UI components (keyboards, messages)
pub mod views;

pub use services::BotServices;
