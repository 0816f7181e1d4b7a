//! The entity store trait all persistent backends implement.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::EntityQuery;
use vercache_core::Entity;

/// A persistent entity store.
///
/// Implementations must be thread-safe (`Send + Sync`). The cache decorator
/// implements this same trait, so stores and decorators compose in any
/// nesting order.
///
/// # Example
///
/// ```ignore
/// use vercache_storage::{EntityStore, EntityQuery, StorageError};
///
/// async fn get_user(store: &dyn EntityStore, query: &EntityQuery) -> Result<(), StorageError> {
///     match store.load(query).await? {
///         Some(user) => println!("{user:?}"),
///         None => println!("no such user"),
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Persists an entity, creating or updating as needed.
    ///
    /// An entity without an id is a creation; the store assigns the id and
    /// the returned entity carries it. The cache layer never invents ids.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidEntity` if the entity is malformed.
    async fn save(&self, entity: &Entity) -> Result<Entity, StorageError>;

    /// Loads the entity matching a query.
    ///
    /// Returns `None` when nothing matches; absence is a valid outcome,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing
    /// entities.
    async fn load(&self, query: &EntityQuery) -> Result<Option<Entity>, StorageError>;

    /// Removes the entity matching a query.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure issues. Removing an entity that
    /// does not exist is backend-defined; the in-memory backend treats it
    /// as an idempotent success.
    async fn remove(&self, query: &EntityQuery) -> Result<(), StorageError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
