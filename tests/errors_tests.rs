use std::error::Error;
use slack_fetch::errors::SlackError;

#[test]
fn test_slack_error_implements_error_trait() {
    // Verify SlackError implements the Error trait
    fn assert_error<T: Error>(_: &T) {}

    let error = SlackError::ParseError("test error".to_string());
    assert_error(&error);
}

#[test]
fn test_slack_error_display() {
    let error = SlackError::ApiError("auth.test error: invalid_auth".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to access Slack API: auth.test error: invalid_auth"
    );

    let error = SlackError::HttpError("Connection error".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to send HTTP request: Connection error"
    );

    let error = SlackError::ConfigError("slack_token can not be null".to_string());
    assert_eq!(
        format!("{error}"),
        "Invalid configuration: slack_token can not be null"
    );

    let error = SlackError::ParseError("users.list: response has no `members` field".to_string());
    assert!(format!("{error}").starts_with("Failed to parse Slack response:"));
}

#[test]
fn test_slack_error_from_conversions() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let slack_err: SlackError = json_err.into();
    assert!(matches!(slack_err, SlackError::ParseError(_)));

    let url_err = url::Url::parse("::nope").unwrap_err();
    let slack_err: SlackError = url_err.into();
    assert!(matches!(slack_err, SlackError::ConfigError(_)));

    // We can't easily build a reqwest::Error directly, but we can verify
    // that the From<reqwest::Error> conversion exists
    #[allow(unused)]
    #[allow(clippy::items_after_statements)]
    fn _check_reqwest_conversion(err: reqwest::Error) -> SlackError {
        SlackError::from(err)
    }
}
