use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical entity type name.
///
/// The canonical string identifies an entity's schema/collection and is part
/// of every cache key, so distinct kinds must never collide in key space.
/// The key format reserves `~` as a separator; a kind containing it is
/// rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKind(String);

impl EntityKind {
    /// Creates a new `EntityKind` from a canonical type name.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidKind` if the name is empty or contains
    /// the reserved key separator `~`.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::invalid_kind("empty kind name"));
        }
        if name.contains('~') {
            return Err(CoreError::invalid_kind(name));
        }
        Ok(Self(name))
    }

    /// The canonical type name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntityKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.0
    }
}
