//! slack-fetch - Fetches channel history, threads and name tables from a Slack
//! workspace for later rendering into a document.
//!
//! # Architecture
//!
//! - [`slack::SlackApi`] is the seam to Slack; [`slack::SlackClient`] implements
//!   it over HTTP with reqwest
//! - [`slack::SlackService`] resolves users, channels and usergroups once at
//!   startup and fetches messages, threads and bot names on demand
//! - [`slack::fetch_pages`] walks Slack's cursor pagination with a fixed pause
//!   between pages
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use slack_fetch::core::config::FetcherConfig;
//! use slack_fetch::slack::{SlackClient, SlackService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     slack_fetch::setup_logging();
//!
//!     let config = FetcherConfig::from_env()?;
//!     let client = Arc::new(SlackClient::from_config(&config)?);
//!     let mut service = SlackService::connect(client, config).await?;
//!
//!     let messages = service
//!         .fetch_messages_from_channel("C12345678", 1_000, None, None)
//!         .await?;
//!     let threads = service
//!         .fetch_threads_from_messages("C12345678", &messages, 1_000, None, None)
//!         .await?;
//!     let bots = service.fetch_bot_names_for_messages(&messages, &threads).await;
//!
//!     println!(
//!         "{} messages, {} threads, {} bots in {}",
//!         messages.len(),
//!         threads.len(),
//!         bots.len(),
//!         service.team().unwrap_or("unknown team")
//!     );
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod slack;
pub mod utils;

/// Configure structured logging with JSON format.
///
/// Honors `RUST_LOG`; defaults to `info` (`debug` with the `debug-logs`
/// feature). Calling it more than once is harmless.
///
/// # Example
///
/// ```
/// slack_fetch::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let default_level = if cfg!(feature = "debug-logs") {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    // a global subscriber may already be installed, e.g. by another test
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
