use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// ID to display name lookup, e.g. user ID to real name.
pub type NameTable = HashMap<String, String>;

/// A message exactly as Slack returned it.
pub type Message = Map<String, Value>;

/// Thread timestamp to the messages in that thread.
pub type Threads = HashMap<String, Vec<Message>>;

/// Payload of `auth.test`, kept whole so callers can read fields we don't model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Session state resolved once at startup and never changed afterwards.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceContext {
    pub workspace_info: WorkspaceInfo,
    pub user_names: NameTable,
    pub channel_names: NameTable,
    pub usergroup_names: NameTable,
    pub author: String,
    /// Profile of the authenticated user as returned by `users.info`, incl. locale.
    pub author_info: Map<String, Value>,
}

/// Reads a string field from an opaque message.
#[must_use]
pub fn str_field<'a>(message: &'a Message, field: &str) -> Option<&'a str> {
    message.get(field).and_then(Value::as_str)
}

/// A thread root is the one message whose `thread_ts` equals its own `ts`.
#[must_use]
pub fn is_thread_root(message: &Message) -> bool {
    match (str_field(message, "thread_ts"), str_field(message, "ts")) {
        (Some(thread_ts), Some(ts)) => thread_ts == ts,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(value: Value) -> Message {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_thread_root_detection() {
        let root = message(json!({"ts": "100.1", "thread_ts": "100.1"}));
        let reply = message(json!({"ts": "100.2", "thread_ts": "100.1"}));
        let plain = message(json!({"ts": "100.3"}));

        assert!(is_thread_root(&root));
        assert!(!is_thread_root(&reply));
        assert!(!is_thread_root(&plain));
    }

    #[test]
    fn test_workspace_info_keeps_unknown_fields() {
        let info: WorkspaceInfo = serde_json::from_value(json!({
            "ok": true,
            "team": "Acme",
            "user_id": "U1",
            "url": "https://acme.slack.com/"
        }))
        .unwrap();

        assert_eq!(info.team.as_deref(), Some("Acme"));
        assert_eq!(info.user_id.as_deref(), Some("U1"));
        assert!(info.team_id.is_none());
        assert_eq!(info.extra["url"], "https://acme.slack.com/");
    }
}
