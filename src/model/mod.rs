//! Model Graph
//!
//! The unlinked entity graph handed over by the parser, and the repository
//! that indexes it by namespace, entity kind and name.
//!
//! Entities live in an arena owned by [`ModelRepository`]. Everything that
//! points at an entity (resolved property targets, base entities, overlays)
//! holds an [`EntityId`] index, never an owning reference.

pub mod entity;
pub mod loader;
pub mod namespace;
pub mod property;
pub mod repository;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use entity::{EntityKind, ModelEntity};
pub use loader::{load_from_directory, LoadConfig, LoadedModel};
pub use namespace::Namespace;
pub use property::{MergeDirective, Property, PropertyCategory, PropertyType, ScalarType};
pub use repository::{Lookup, ModelRepository};

// =============================================================================
// Identifiers
// =============================================================================

/// Index of an entity in the repository arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub(crate) usize);

impl EntityId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A property addressed by its owning entity and declaration position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyRef {
    pub entity: EntityId,
    pub index: usize,
}

impl PropertyRef {
    pub fn new(entity: EntityId, index: usize) -> Self {
        Self { entity, index }
    }
}

// =============================================================================
// Source Locations
// =============================================================================

/// Where a token came from in the MetaEd source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub line: u32,
    pub column: u32,
    pub token_text: String,
}

impl SourceMap {
    pub fn new(line: u32, column: u32, token_text: impl Into<String>) -> Self {
        Self {
            line,
            column,
            token_text: token_text.into(),
        }
    }
}

// =============================================================================
// Type Names
// =============================================================================

/// A symbolic reference to an entity, optionally namespace-qualified
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeName {
    pub namespace: Option<String>,
    pub name: String,
}

impl TypeName {
    /// An unqualified name
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// A name qualified with its namespace
    pub fn qualified(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Parse `Name` or `Namespace.Name`
    pub fn parse(text: &str) -> Self {
        match text.split_once('.') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                Self::qualified(namespace, name)
            }
            _ => Self::local(text),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.namespace.is_some()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}.{}", namespace, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.to_string()
    }
}
