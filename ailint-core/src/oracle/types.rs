use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle not configured")]
    NotConfigured,
    #[error("oracle timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("oracle reported error: {0}")]
    Remote(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            OracleError::Timeout
        } else if e.is_decode() {
            OracleError::InvalidResponse(e.to_string())
        } else {
            OracleError::Network(e.to_string())
        }
    }
}
