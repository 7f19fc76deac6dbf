use thiserror::Error;

pub type Result<T> = std::result::Result<T, TextProxyError>;

#[derive(Debug, Error)]
pub enum TextProxyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl TextProxyError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TextProxyError::Timeout(_))
    }
}

impl From<reqwest::Error> for TextProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TextProxyError::Timeout(err.to_string())
        } else {
            TextProxyError::Network(err.to_string())
        }
    }
}
