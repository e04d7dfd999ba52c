use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to parse Slack response: {0}")]
    ParseError(String),

    #[error("Failed to access Slack API: {0}")]
    ApiError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),
}

impl From<reqwest::Error> for SlackError {
    fn from(error: reqwest::Error) -> Self {
        SlackError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(error: serde_json::Error) -> Self {
        SlackError::ParseError(error.to_string())
    }
}

impl From<url::ParseError> for SlackError {
    fn from(error: url::ParseError) -> Self {
        SlackError::ConfigError(format!("invalid URL: {error}"))
    }
}
