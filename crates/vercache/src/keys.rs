//! Cache key derivation.
//!
//! Both namespaces share one prefix and use `~` as the segment separator
//! (which [`EntityKind`] guarantees never appears in a kind name):
//!
//! - version keys: `prefix~v~kind~id`
//! - data keys: `prefix~d~generation~kind~id`
//!
//! Data keys embed the generation, so distinct generations of one entity
//! never collide; a save moves the version pointer and writes a fresh data
//! key rather than overwriting the old one.

use vercache_core::EntityKind;

/// Derives version and data keys from a configured prefix.
#[derive(Debug, Clone)]
pub struct KeyScheme {
    prefix: String,
}

impl KeyScheme {
    /// Creates a scheme with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The version key for one (kind, id) pair.
    ///
    /// Example: `vercache~v~user~171qa9`
    #[must_use]
    pub fn version_key(&self, kind: &EntityKind, id: &str) -> String {
        format!("{}~v~{}~{}", self.prefix, kind, id)
    }

    /// The data key for one generation of one (kind, id) pair.
    ///
    /// Example: `vercache~d~2~user~171qa9`
    #[must_use]
    pub fn data_key(&self, kind: &EntityKind, id: &str, generation: u64) -> String {
        format!("{}~d~{}~{}~{}", self.prefix, generation, kind, id)
    }
}
