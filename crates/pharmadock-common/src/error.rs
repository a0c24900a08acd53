use thiserror::Error;

#[derive(Debug, Error)]
pub enum PharmaDockError {
    #[error("Path escapes the file root: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, PharmaDockError>;
