use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;
