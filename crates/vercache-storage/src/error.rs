//! Error types for entity store operations.

use std::fmt;

/// Errors that can occur during entity store operations.
///
/// The cache decorator implements [`EntityStore`](crate::EntityStore) with
/// this same error type: persistent-store failures pass through verbatim,
/// while remote cache-service failures are mapped to `CacheBackend`.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested entity was not found.
    #[error("Entity not found: {kind}/{id}")]
    NotFound {
        /// The kind of entity that was not found.
        kind: String,
        /// The id of the entity that was not found.
        id: String,
    },

    /// The entity data is invalid.
    #[error("Invalid entity: {message}")]
    InvalidEntity {
        /// Description of why the entity is invalid.
        message: String,
    },

    /// The query shape is not supported by the backend.
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// Description of the problem.
        message: String,
    },

    /// The remote cache service failed during a version or data operation.
    #[error("Cache backend error: {message}")]
    CacheBackend {
        /// Description of the remote failure.
        message: String,
    },

    /// Failed to connect to the storage backend.
    #[error("Connection error: {message}")]
    ConnectionError {
        /// Description of the connection error.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Creates a new `InvalidEntity` error.
    #[must_use]
    pub fn invalid_entity(message: impl Into<String>) -> Self {
        Self::InvalidEntity {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidQuery` error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a new `CacheBackend` error.
    #[must_use]
    pub fn cache_backend(message: impl Into<String>) -> Self {
        Self::CacheBackend {
            message: message.into(),
        }
    }

    /// Creates a new `ConnectionError` error.
    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this error originated in the remote cache service.
    #[must_use]
    pub fn is_cache_backend(&self) -> bool {
        matches!(self, Self::CacheBackend { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidEntity { .. } | Self::InvalidQuery { .. } => ErrorCategory::Validation,
            Self::CacheBackend { .. } => ErrorCategory::Cache,
            Self::ConnectionError { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Entity not found.
    NotFound,
    /// Validation error.
    Validation,
    /// Remote cache service error.
    Cache,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Cache => write!(f, "cache"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
