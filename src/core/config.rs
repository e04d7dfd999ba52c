use std::env;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::errors::SlackError;

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Max messages retrieved per request while paging.
pub const MESSAGES_PER_PAGE: usize = 100;

/// Fixed pause between dependent calls to stay under Slack's rate limits.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Checked at connect time, not at load time.
    pub slack_token: Option<String>,
    pub api_base_url: String,
    pub page_size: usize,
    pub request_interval: Duration,
    pub http_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            slack_token: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: MESSAGES_PER_PAGE,
            request_interval: DEFAULT_REQUEST_INTERVAL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl FetcherConfig {
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slack_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if an optional variable is set but malformed.
    pub fn from_env() -> Result<Self, SlackError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests need not touch
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is set but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SlackError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = match lookup("SLACK_API_BASE_URL") {
            Some(raw) => {
                Url::parse(&raw)?;
                raw.trim_end_matches('/').to_string()
            }
            None => defaults.api_base_url,
        };

        let page_size =
            parse_var::<usize>(&lookup, "SLACK_PAGE_SIZE")?.unwrap_or(defaults.page_size);
        if page_size == 0 {
            return Err(SlackError::ConfigError(
                "SLACK_PAGE_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            slack_token: lookup("SLACK_TOKEN").filter(|t| !t.is_empty()),
            api_base_url,
            page_size,
            request_interval: parse_var::<u64>(&lookup, "SLACK_REQUEST_INTERVAL_MS")?
                .map_or(defaults.request_interval, Duration::from_millis),
            http_timeout: parse_var::<u64>(&lookup, "SLACK_HTTP_TIMEOUT_SECS")?
                .map_or(defaults.http_timeout, Duration::from_secs),
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, SlackError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| SlackError::ConfigError(format!("{key}: {e}")))
        })
        .transpose()
}
