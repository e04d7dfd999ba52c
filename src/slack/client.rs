//! Slack Web API client
//!
//! Invokes named API methods over HTTP with retry logic for transport failures
//! and HTTP 429 rate limiting.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::core::config::{DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT, FetcherConfig};
use crate::errors::SlackError;
use crate::slack::api::SlackApi;

/// Attempts per call before a rate-limited request gives up.
const MAX_RATE_LIMIT_RETRIES: u32 = 5;

/// Slack error codes signalling rate limiting in the response body.
const RATE_LIMITED_CODES: [&str; 2] = ["ratelimited", "rate_limited"];

/// HTTP implementation of [`SlackApi`].
pub struct SlackClient {
    http: Client,
    token: String,
    base_url: String,
}

impl SlackClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self, SlackError> {
        Self::with_base_url(token, DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if no token is configured, or an error if the
    /// HTTP client cannot be built.
    pub fn from_config(config: &FetcherConfig) -> Result<Self, SlackError> {
        let token = config
            .slack_token
            .clone()
            .ok_or_else(|| SlackError::ConfigError("slack_token can not be null".to_string()))?;

        Self::with_base_url(token, &config.api_base_url, config.http_timeout)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, SlackError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            token: token.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request, retrying only on transport failures.
    async fn send_with_retry(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<Response, SlackError> {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(5);

        RetryIf::spawn(
            strategy,
            || async move {
                self.http
                    .post(url)
                    .bearer_auth(&self.token)
                    .form(form)
                    .send()
                    .await
                    .map_err(|e| SlackError::HttpError(format!("Request to {url} failed: {e}")))
            },
            |e: &SlackError| matches!(e, SlackError::HttpError(_)),
        )
        .await
    }

    /// Parse the `Retry-After` header from an HTTP 429 response.
    ///
    /// Falls back to 1 second if the header is missing or invalid.
    fn parse_retry_after(resp: &Response) -> Duration {
        resp.headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map_or(Duration::from_secs(1), Duration::from_secs)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn call(&self, method: &str, args: &Value) -> Result<Value, SlackError> {
        let url = format!("{}/{method}", self.base_url);
        let form = form_params(args)?;
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(method, attempt = attempts, "Calling Slack API");

            let resp = self.send_with_retry(&url, &form).await?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempts >= MAX_RATE_LIMIT_RETRIES {
                    return Err(SlackError::ApiError(format!(
                        "{method} rate limited after {MAX_RATE_LIMIT_RETRIES} retries"
                    )));
                }

                let retry_after = Self::parse_retry_after(&resp);
                warn!(
                    "Slack rate limited (429), waiting {}s before retry (attempt {}/{})",
                    retry_after.as_secs(),
                    attempts,
                    MAX_RATE_LIMIT_RETRIES
                );
                tokio::time::sleep(retry_after).await;
                continue;
            }

            if !resp.status().is_success() {
                return Err(SlackError::ApiError(format!(
                    "{method} HTTP {}",
                    resp.status()
                )));
            }

            let body: Value = resp.json().await.map_err(|e| {
                SlackError::ParseError(format!("{method} JSON parse error: {e}"))
            })?;

            let error_code = body.get("error").and_then(Value::as_str);
            if let Some(code) = error_code
                && RATE_LIMITED_CODES.contains(&code)
            {
                if attempts >= MAX_RATE_LIMIT_RETRIES {
                    return Err(SlackError::ApiError(format!(
                        "{method} rate limited (response body) after \
                         {MAX_RATE_LIMIT_RETRIES} retries"
                    )));
                }
                warn!(
                    "Slack rate limited (response), waiting 1s before retry (attempt {}/{})",
                    attempts, MAX_RATE_LIMIT_RETRIES
                );
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }

            return Ok(body);
        }
    }
}

/// Flattens a JSON object of arguments into form fields.
///
/// Strings are sent as-is, other scalars in their JSON text form, nested
/// values as JSON. `null` arguments are omitted.
fn form_params(args: &Value) -> Result<Vec<(String, String)>, SlackError> {
    let obj = match args {
        Value::Null => return Ok(Vec::new()),
        Value::Object(obj) => obj,
        other => {
            return Err(SlackError::ParseError(format!(
                "API arguments must be an object, got: {other}"
            )));
        }
    };

    Ok(obj
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect())
}
