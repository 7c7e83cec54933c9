use thiserror::Error;

#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum MispApiError {
    #[error("Failed to create HTTP client: {0}")]
    HttpClientCreationError(reqwest::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("MISP API error: {0}")]
    ApiError(String),

    #[error("Event with ID '{0}' not found")]
    EventNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("MISP client error: {0}")]
    ClientError(String),
}
