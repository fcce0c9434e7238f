use std::fmt;

/// Errors that can occur during image storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested image was not found.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The provided storage key or folder is invalid.
    InvalidKey(String),
    /// The image exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The remote image host rejected or failed the operation.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "image not found: {key}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidKey(msg) => write!(f, "invalid storage key: {msg}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "image exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::Backend(msg) => write!(f, "image host error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
