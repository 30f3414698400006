use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Normalized outcome of a provider call. Transport failures, timeouts,
/// non-2xx statuses and undecodable payloads all collapse into
/// `Unavailable`; `NotFound` is reserved for an explicit upstream 404.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Mailbox or message not found upstream")]
    NotFound,

    #[error("Mail provider unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            ProviderError::NotFound
        } else if err.is_timeout() {
            ProviderError::Unavailable("request timed out".to_string())
        } else {
            ProviderError::Unavailable(err.to_string())
        }
    }
}
