//! Id generation for store-assigned entity identities.

/// Generates a fresh entity id.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
