use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{file} payload is empty or too short ({len} bytes)")]
    InvalidPayload { file: String, len: usize },

    #[error("Viewer error: {0}")]
    Viewer(String),

    #[error("Markdown conversion failed: {0}")]
    Markdown(String),

    #[error("Path escapes the asset root: {0}")]
    InvalidPath(String),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
