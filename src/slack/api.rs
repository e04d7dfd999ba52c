//! The seam between the fetcher and whatever actually talks to Slack.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SlackError;

/// A client able to invoke named Slack Web API methods.
///
/// Implementations return the raw JSON payload. Transport problems are
/// `Err`; an application-level rejection is an `Ok` payload with
/// `"ok": false`, which callers check with [`ensure_ok`].
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the request could not be sent or the body could
    /// not be decoded.
    async fn call(&self, method: &str, args: &Value) -> Result<Value, SlackError>;
}

/// Turns a payload with `ok != true` into an `ApiError`.
///
/// # Errors
///
/// Returns `ApiError` carrying Slack's `error` code when the call failed.
pub fn ensure_ok(method: &str, response: &Value) -> Result<(), SlackError> {
    if response.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(());
    }

    Err(SlackError::ApiError(format!(
        "{method} error: {}",
        response
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ensure_ok_accepts_success() {
        assert!(ensure_ok("auth.test", &json!({"ok": true})).is_ok());
    }

    #[test]
    fn test_ensure_ok_reports_error_code() {
        let err = ensure_ok("users.list", &json!({"ok": false, "error": "invalid_auth"}))
            .unwrap_err();
        match err {
            SlackError::ApiError(msg) => assert_eq!(msg, "users.list error: invalid_auth"),
            other => panic!("Expected ApiError, got: {other:?}"),
        }
    }

    #[test]
    fn test_ensure_ok_treats_missing_flag_as_failure() {
        let err = ensure_ok("bots.info", &json!({"bot": {}})).unwrap_err();
        assert!(format!("{err}").contains("bots.info error: unknown"));
    }
}
