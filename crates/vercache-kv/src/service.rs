//! The key-value service trait all remote cache backends implement.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Errors surfaced by a key-value service backend.
///
/// The cache middleware never retries these; they are counted and
/// propagated to the caller.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// The backend could not be reached or the round-trip failed.
    #[error("Key-value transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// A stored value had an unexpected shape for the requested operation.
    #[error("Invalid value at key {key}: {message}")]
    InvalidValue {
        /// The key holding the offending value.
        key: String,
        /// Description of the mismatch.
        message: String,
    },
}

impl KvError {
    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a transport error.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// A shared remote key-value service.
///
/// One service backs both the version namespace and the data namespace;
/// the two stay disjoint by key construction. Every operation is a single
/// round-trip assumed atomic at the backend; in particular `incr` is an
/// atomic increment-and-return, which the versioning protocol relies on.
#[async_trait]
pub trait KvService: Send + Sync {
    /// Reads a value. Returns `None` when the key is absent or expired.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport/backend failures, not for
    /// missing keys.
    async fn get(&self, key: &str) -> Result<Option<Value>, KvError>;

    /// Writes a value unconditionally, with an optional time-to-live.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), KvError>;

    /// Writes a value only if the key is absent.
    ///
    /// Returns `true` when this call created the key, `false` when a live
    /// value was already present. Racing creators are decided by the
    /// backend; this layer imposes no tie-break.
    async fn add(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<bool, KvError>;

    /// Atomically increments a numeric value and returns the new value.
    ///
    /// Returns `None` when the key is absent. The key is *not* created.
    ///
    /// # Errors
    ///
    /// Returns `KvError::InvalidValue` when the stored value is not an
    /// integer.
    async fn incr(&self, key: &str, delta: i64) -> Result<Option<i64>, KvError>;
}
