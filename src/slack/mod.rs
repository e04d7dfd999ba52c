//! All Slack-specific functionality

pub mod api;
pub mod client;
pub mod pagination;
pub mod service;

// Re-export main types for convenience
pub use api::{SlackApi, ensure_ok};
pub use client::SlackClient;
pub use pagination::{PageRequest, fetch_pages, next_cursor};
pub use service::{SlackService, TEST_TOKEN};
