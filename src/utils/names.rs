use serde_json::Value;

use crate::core::models::NameTable;

/// Reduces a list of Slack records to an ID to name table.
///
/// The value comes from `primary` if present, else from `secondary` when
/// given. Records without `key`, or without either name field, are dropped.
/// Only string values count; anything else is treated as absent.
#[must_use]
pub fn reduce_to_dict(
    items: &[Value],
    key: &str,
    primary: &str,
    secondary: Option<&str>,
) -> NameTable {
    items
        .iter()
        .filter_map(|item| {
            let id = item.get(key).and_then(Value::as_str)?;
            let name = item
                .get(primary)
                .and_then(Value::as_str)
                .or_else(|| secondary.and_then(|s| item.get(s)).and_then(Value::as_str))?;
            Some((id.to_string(), name.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reduce_prefers_primary_then_secondary() {
        let items = vec![
            json!({"id": "U1", "real_name": "Alice"}),
            json!({"id": "U2", "name": "bob"}),
            json!({"id": "U3"}),
        ];

        let names = reduce_to_dict(&items, "id", "real_name", Some("name"));

        assert_eq!(names.len(), 2);
        assert_eq!(names["U1"], "Alice");
        assert_eq!(names["U2"], "bob");
        assert!(!names.contains_key("U3"));
    }

    #[test]
    fn test_reduce_primary_wins_when_both_present() {
        let items = vec![json!({"id": "U1", "real_name": "Alice Doe", "name": "alice"})];
        let names = reduce_to_dict(&items, "id", "real_name", Some("name"));
        assert_eq!(names["U1"], "Alice Doe");
    }

    #[test]
    fn test_reduce_without_secondary_drops_records() {
        let items = vec![
            json!({"id": "C1", "name": "general"}),
            json!({"id": "C2", "topic": "no name here"}),
            json!({"name": "orphan"}),
        ];

        let names = reduce_to_dict(&items, "id", "name", None);

        assert_eq!(names.len(), 1);
        assert_eq!(names["C1"], "general");
    }

    #[test]
    fn test_reduce_ignores_non_string_values() {
        let items = vec![
            json!({"id": 42, "name": "numeric id"}),
            json!({"id": "U5", "real_name": null, "name": "fallback"}),
        ];

        let names = reduce_to_dict(&items, "id", "real_name", Some("name"));

        assert_eq!(names.len(), 1);
        assert_eq!(names["U5"], "fallback");
    }
}
