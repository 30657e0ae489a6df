//! Namespaces
//!
//! A namespace owns its entities and lists the namespaces it depends on.
//! Core never depends on an extension.

use std::collections::HashMap;

use super::entity::EntityKind;
use super::EntityId;

/// A namespace with its entity index
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub name: String,
    pub is_extension: bool,
    /// Direct dependencies in declared order
    pub dependencies: Vec<String>,
    /// Entities in declaration order
    pub(crate) entities: Vec<EntityId>,
    /// kind -> name -> entity
    pub(crate) by_kind: HashMap<EntityKind, HashMap<String, EntityId>>,
}

impl Namespace {
    pub fn core(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn extension(name: impl Into<String>, dependencies: Vec<String>) -> Self {
        Self {
            name: name.into(),
            is_extension: true,
            dependencies,
            ..Self::default()
        }
    }

    /// Entity ids in declaration order
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entities
    }

    /// Find an entity of any of the given kinds by name
    pub fn find(&self, kinds: &[EntityKind], name: &str) -> Option<EntityId> {
        kinds
            .iter()
            .find_map(|kind| self.by_kind.get(kind).and_then(|names| names.get(name)).copied())
    }

    /// All names declared under the given kinds
    pub fn names_of<'a>(&'a self, kinds: &'a [EntityKind]) -> impl Iterator<Item = &'a str> + 'a {
        kinds
            .iter()
            .filter_map(|kind| self.by_kind.get(kind))
            .flat_map(|names| names.keys().map(String::as_str))
    }

    pub(crate) fn index(&mut self, kind: EntityKind, name: &str, id: EntityId) -> bool {
        let names = self.by_kind.entry(kind).or_default();
        if names.contains_key(name) {
            return false;
        }
        names.insert(name.to_string(), id);
        self.entities.push(id);
        true
    }

    pub(crate) fn unindex(&mut self, kind: EntityKind, name: &str, id: EntityId) {
        if let Some(names) = self.by_kind.get_mut(&kind) {
            names.remove(name);
        }
        self.entities.retain(|e| *e != id);
    }
}
