use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlipperError>;

/// Coarse classification used to decide how a failure is recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Parse,
    Validation,
    Storage,
}

#[derive(Error, Debug)]
pub enum FlipperError {
    #[error("Fetch failed for {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid watchlist format: expected a JSON array")]
    InvalidFormat,

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Save in progress")]
    SaveInProgress,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl FlipperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlipperError::Fetch { .. } | FlipperError::Http(_) => ErrorKind::Fetch,
            FlipperError::Json(_) | FlipperError::Parse(_) | FlipperError::InvalidFormat => {
                ErrorKind::Parse
            }
            FlipperError::InvalidShape(_)
            | FlipperError::Validation(_)
            | FlipperError::SaveInProgress => ErrorKind::Validation,
            FlipperError::Database(_) | FlipperError::Io(_) | FlipperError::Storage(_) => {
                ErrorKind::Storage
            }
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        FlipperError::Validation(msg.into())
    }

    pub fn fetch(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        FlipperError::Fetch {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(FlipperError::fetch("scored", "404").kind(), ErrorKind::Fetch);
        assert_eq!(FlipperError::InvalidFormat.kind(), ErrorKind::Parse);
        assert_eq!(FlipperError::SaveInProgress.kind(), ErrorKind::Validation);
        assert_eq!(
            FlipperError::Storage("quota".to_string()).kind(),
            ErrorKind::Storage
        );
    }
}
