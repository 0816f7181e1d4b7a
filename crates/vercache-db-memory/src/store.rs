use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;

use vercache_core::{Entity, EntityKind, generate_id};
use vercache_storage::{EntityQuery, EntityStore, QueryFilter, StorageError};

pub type StorageKey = String; // Format: "kind/id"

pub(crate) fn make_storage_key(kind: &EntityKind, id: &str) -> StorageKey {
    format!("{kind}/{id}")
}

/// In-memory entity store using a papaya lock-free HashMap.
///
/// Saves are upserts; an entity arriving without an id gets a generated one.
/// Field-equality queries scan entities of the query's kind and match on
/// field subsets.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: PapayaHashMap<StorageKey, Entity>,
}

impl MemoryStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities.
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.pin().len()
    }

    fn find_by_fields(&self, kind: &EntityKind, fields: &vercache_core::FieldMap) -> Option<Entity> {
        let prefix = format!("{kind}/");
        let guard = self.data.pin();
        guard
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .find(|(_, ent)| {
                let map = ent.data_map();
                fields.iter().all(|(k, v)| map.get(k) == Some(v))
            })
            .map(|(_, ent)| ent.clone())
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn save(&self, entity: &Entity) -> Result<Entity, StorageError> {
        let mut saved = entity.clone();
        if saved.id.is_none() {
            saved.id = Some(generate_id());
        }
        let id = saved.id.clone().ok_or_else(|| {
            StorageError::internal("id assignment failed")
        })?;

        let key = make_storage_key(&saved.kind, &id);
        let guard = self.data.pin();
        guard.insert(key, saved.clone());
        Ok(saved)
    }

    async fn load(&self, query: &EntityQuery) -> Result<Option<Entity>, StorageError> {
        if let Some(id) = query.exact_id() {
            let key = make_storage_key(&query.kind, &id);
            let guard = self.data.pin();
            return Ok(guard.get(&key).cloned());
        }

        match &query.filter {
            QueryFilter::Fields(fields) => Ok(self.find_by_fields(&query.kind, fields)),
            // exact_id() already covered the bare-id shape
            QueryFilter::Id(_) => Ok(None),
        }
    }

    async fn remove(&self, query: &EntityQuery) -> Result<(), StorageError> {
        if let Some(id) = query.exact_id() {
            let key = make_storage_key(&query.kind, &id);
            let guard = self.data.pin();
            // Removing an absent entity is an idempotent success.
            guard.remove(&key);
            return Ok(());
        }

        if let QueryFilter::Fields(fields) = &query.filter {
            if let Some(found) = self.find_by_fields(&query.kind, fields) {
                if let Some(id) = &found.id {
                    let key = make_storage_key(&query.kind, id);
                    self.data.pin().remove(&key);
                }
            }
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
