use thiserror::Error;

/// Core error types for vercache operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid entity kind: {0}")]
    InvalidKind(String),

    #[error("Invalid entity id: {0}")]
    InvalidId(String),

    #[error("Invalid entity data: {message}")]
    InvalidEntity { message: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidKind error
    pub fn invalid_kind(kind: impl Into<String>) -> Self {
        Self::InvalidKind(kind.into())
    }

    /// Create a new InvalidId error
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId(id.into())
    }

    /// Create a new InvalidEntity error
    pub fn invalid_entity(message: impl Into<String>) -> Self {
        Self::InvalidEntity {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
