//! Cursor pagination over Slack list methods.
//!
//! Slack returns `response_metadata.next_cursor` while more rows are
//! available. Pages are requested one after another with a fixed pause in
//! between to stay under the per-method rate limits.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::errors::SlackError;
use crate::slack::api::{SlackApi, ensure_ok};

/// Everything needed to walk one paginated Slack method.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// API method, e.g. `conversations.history`.
    pub method: String,
    /// Arguments sent with every page. Must be a JSON object.
    pub args: Value,
    /// Page size; each request asks for at most this many rows.
    pub limit: usize,
    /// Name of the list field in the response, e.g. `messages`.
    pub key: String,
    /// Stop once this many rows have been collected.
    pub max_rows: usize,
}

impl PageRequest {
    #[must_use]
    pub fn new(method: &str, args: Value, limit: usize, key: &str, max_rows: usize) -> Self {
        Self {
            method: method.to_string(),
            args,
            limit,
            key: key.to_string(),
            max_rows,
        }
    }

    fn page_args(&self, limit: usize, cursor: Option<&str>) -> Value {
        let mut args = match &self.args {
            Value::Object(obj) => obj.clone(),
            _ => serde_json::Map::new(),
        };
        args.insert("limit".to_string(), Value::from(limit));
        if let Some(cursor) = cursor {
            args.insert("cursor".to_string(), Value::String(cursor.to_string()));
        }
        Value::Object(args)
    }
}

/// Fetches rows page by page until `max_rows` is reached or Slack reports no
/// further cursor.
///
/// # Errors
///
/// Returns an error as soon as any page fails; rows from earlier pages are
/// discarded.
pub async fn fetch_pages(
    api: &dyn SlackApi,
    request: &PageRequest,
    interval: Duration,
) -> Result<Vec<Value>, SlackError> {
    if request.max_rows == 0 {
        return Ok(Vec::new());
    }

    let method = request.method.as_str();
    let mut page = 1;

    debug!(method, page, "Fetching page");
    let first_limit = request.limit.min(request.max_rows);
    let mut response = api.call(method, &request.page_args(first_limit, None)).await?;
    ensure_ok(method, &response)?;
    let mut rows = extract_rows(method, &request.key, &mut response)?;

    while rows.len() < request.max_rows {
        let Some(cursor) = next_cursor(&response) else {
            break;
        };

        page += 1;
        debug!(method, page, "Fetching page");
        tokio::time::sleep(interval).await;

        // allow a smaller final page so we never exceed max_rows
        let page_limit = request.limit.min(request.max_rows - rows.len());
        response = api
            .call(method, &request.page_args(page_limit, Some(&cursor)))
            .await?;
        ensure_ok(method, &response)?;
        rows.extend(extract_rows(method, &request.key, &mut response)?);
    }

    rows.truncate(request.max_rows);
    Ok(rows)
}

/// The continuation cursor, if Slack sent a non-empty one.
#[must_use]
pub fn next_cursor(response: &Value) -> Option<String> {
    response
        .get("response_metadata")
        .and_then(|rm| rm.get("next_cursor"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToOwned::to_owned)
}

fn extract_rows(method: &str, key: &str, response: &mut Value) -> Result<Vec<Value>, SlackError> {
    match response.get_mut(key).map(Value::take) {
        Some(Value::Array(rows)) => Ok(rows),
        Some(other) => Err(SlackError::ParseError(format!(
            "{method}: expected `{key}` to be a list, got: {other}"
        ))),
        None => Err(SlackError::ParseError(format!(
            "{method}: response has no `{key}` field"
        ))),
    }
}
