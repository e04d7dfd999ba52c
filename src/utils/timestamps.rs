use chrono::{DateTime, Utc};

/// Slack treats `"0"` as "no bound" for `oldest` and `latest`.
pub const UNBOUNDED_TS: &str = "0";

/// Renders an optional time bound in Slack's `seconds.micros` form.
#[must_use]
pub fn to_slack_ts(bound: Option<DateTime<Utc>>) -> String {
    let Some(dt) = bound else {
        return UNBOUNDED_TS.to_string();
    };
    // sign applies to the whole value, so split the magnitude
    let micros = dt.timestamp_micros();
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    format!("{sign}{}.{:06}", abs / 1_000_000, abs % 1_000_000)
}
