#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};
use slack_fetch::errors::SlackError;
use slack_fetch::slack::SlackApi;
use tokio::time::Instant;

/// One recorded call to the scripted API.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub args: Value,
    pub at: Instant,
}

/// In-memory `SlackApi` that replays queued responses per method and records
/// every call it receives.
#[derive(Default)]
pub struct ScriptedApi {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, String>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &str, response: Value) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(response));
        self
    }

    pub fn fail(&self, method: &str, error: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Err(error.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }
}

#[async_trait]
impl SlackApi for ScriptedApi {
    async fn call(&self, method: &str, args: &Value) -> Result<Value, SlackError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.to_string(),
            args: args.clone(),
            at: Instant::now(),
        });

        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(error)) => Err(SlackError::HttpError(error)),
            None => panic!("no scripted response left for {method}"),
        }
    }
}

/// A page of `count` messages with timestamps starting at `first_ts`.
pub fn message_page(first_ts: u64, count: u64, next_cursor: Option<&str>) -> Value {
    let messages: Vec<Value> = (first_ts..first_ts + count)
        .map(|ts| json!({"type": "message", "ts": format!("{ts}.000100"), "text": "hi"}))
        .collect();
    page("messages", messages, next_cursor)
}

/// A successful list response with optional continuation cursor.
pub fn page(key: &str, rows: Vec<Value>, next_cursor: Option<&str>) -> Value {
    let mut response = json!({ "ok": true });
    response[key] = Value::Array(rows);
    if let Some(cursor) = next_cursor {
        response["response_metadata"] = json!({ "next_cursor": cursor });
    } else {
        response["response_metadata"] = json!({ "next_cursor": "" });
    }
    response
}

/// Asserts that `later` was issued one fixed interval after `earlier`.
pub fn assert_spaced(earlier: &RecordedCall, later: &RecordedCall, interval: std::time::Duration) {
    let gap = later.at - earlier.at;
    assert!(
        gap >= interval && gap < interval + std::time::Duration::from_millis(5),
        "expected {} to follow {} after {interval:?}, got {gap:?}",
        later.method,
        earlier.method
    );
}
