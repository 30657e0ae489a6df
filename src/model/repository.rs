//! Namespace & Entity Repository
//!
//! Owns every entity in an arena and indexes them per namespace by kind and
//! name. Lookups honor namespace visibility: a namespace sees itself and its
//! direct dependencies, in declared order.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::HashMap;

use super::entity::{EntityKind, ModelEntity};
use super::namespace::Namespace;
use super::property::Property;
use super::{EntityId, PropertyRef, TypeName};
use crate::error::{LinkError, Result};

/// Outcome of a visibility-aware lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(EntityId),
    NotFound,
    /// A qualified name pointed at a namespace the caller cannot see
    NamespaceNotVisible(String),
}

impl Lookup {
    pub fn found(&self) -> Option<EntityId> {
        match self {
            Self::Found(id) => Some(*id),
            _ => None,
        }
    }
}

/// Per-namespace entity maps plus the namespace dependency list
#[derive(Debug, Clone, Default)]
pub struct ModelRepository {
    namespaces: Vec<Namespace>,
    namespace_index: HashMap<String, usize>,
    entities: Vec<Option<ModelEntity>>,
}

impl ModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    pub fn add_namespace(&mut self, namespace: Namespace) -> Result<()> {
        if self.namespace_index.contains_key(&namespace.name) {
            return Err(LinkError::DuplicateNamespace(namespace.name));
        }
        self.namespace_index
            .insert(namespace.name.clone(), self.namespaces.len());
        self.namespaces.push(namespace);
        Ok(())
    }

    /// Add an entity to the namespace it names
    pub fn add_entity(&mut self, mut entity: ModelEntity) -> Result<EntityId> {
        let id = EntityId(self.entities.len());
        let slot = *self
            .namespace_index
            .get(&entity.namespace)
            .ok_or_else(|| LinkError::UnknownNamespace(entity.namespace.clone()))?;

        if !self.namespaces[slot].index(entity.kind, &entity.name, id) {
            return Err(LinkError::DuplicateEntity {
                kind: entity.kind.to_string(),
                name: entity.name,
                namespace: entity.namespace,
            });
        }

        entity.id = Some(id);
        self.entities.push(Some(entity));
        Ok(id)
    }

    /// Remove an entity. Only the duplicate simple type diminisher does this.
    pub(crate) fn remove_entity(&mut self, id: EntityId) -> Option<ModelEntity> {
        let entity = self.entities.get_mut(id.0)?.take()?;
        if let Some(&slot) = self.namespace_index.get(&entity.namespace) {
            self.namespaces[slot].unindex(entity.kind, &entity.name, id);
        }
        Some(entity)
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn entity(&self, id: EntityId) -> Option<&ModelEntity> {
        self.entities.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut ModelEntity> {
        self.entities.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn property(&self, property: PropertyRef) -> Option<&Property> {
        self.entity(property.entity)?.properties.get(property.index)
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespace_index.get(name).map(|&i| &self.namespaces[i])
    }

    /// Namespaces in declaration order
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.iter()
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_some()).count()
    }

    /// The namespace itself followed by its direct dependencies
    pub fn visible_namespaces(&self, name: &str) -> Vec<&Namespace> {
        let Some(namespace) = self.namespace(name) else {
            return Vec::new();
        };
        std::iter::once(namespace)
            .chain(namespace.dependencies.iter().filter_map(|d| self.namespace(d)))
            .collect()
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    /// Namespace names with every dependency before its dependents.
    ///
    /// Fails on unknown dependencies and dependency cycles.
    pub fn dependency_order(&self) -> Result<Vec<String>> {
        let mut graph = DiGraph::<usize, ()>::with_capacity(self.namespaces.len(), self.namespaces.len());
        let nodes: Vec<_> = (0..self.namespaces.len()).map(|i| graph.add_node(i)).collect();

        for (i, namespace) in self.namespaces.iter().enumerate() {
            for dependency in &namespace.dependencies {
                let &dep = self.namespace_index.get(dependency).ok_or_else(|| {
                    LinkError::UnknownDependency {
                        namespace: namespace.name.clone(),
                        dependency: dependency.clone(),
                    }
                })?;
                graph.add_edge(nodes[dep], nodes[i], ());
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            LinkError::DependencyCycle(self.namespaces[graph[cycle.node_id()]].name.clone())
        })?;

        Ok(order
            .into_iter()
            .map(|node| self.namespaces[graph[node]].name.clone())
            .collect())
    }

    /// Entity ids in traversal order: namespaces dependency-first, then
    /// entities in declaration order.
    pub fn entities_in_order(&self) -> Result<Vec<EntityId>> {
        let mut ids = Vec::with_capacity(self.entities.len());
        for name in self.dependency_order()? {
            if let Some(namespace) = self.namespace(&name) {
                ids.extend(namespace.entity_ids().iter().copied());
            }
        }
        Ok(ids)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Resolve a symbolic name as seen from a namespace.
    ///
    /// Unqualified names search the namespace, then each dependency in
    /// declared order; first match wins. Qualified names must match exactly
    /// in a visible namespace.
    pub fn find_visible(&self, from: &str, kinds: &[EntityKind], target: &TypeName) -> Lookup {
        let visible = self.visible_namespaces(from);

        if let Some(qualifier) = &target.namespace {
            let Some(namespace) = visible.iter().find(|n| &n.name == qualifier) else {
                return Lookup::NamespaceNotVisible(qualifier.clone());
            };
            return namespace
                .find(kinds, &target.name)
                .map_or(Lookup::NotFound, Lookup::Found);
        }

        visible
            .iter()
            .find_map(|namespace| namespace.find(kinds, &target.name))
            .map_or(Lookup::NotFound, Lookup::Found)
    }

    /// Find by name in any namespace, in declaration order
    pub fn find_by_name(&self, kinds: &[EntityKind], name: &str) -> Option<EntityId> {
        self.namespaces
            .iter()
            .find_map(|namespace| namespace.find(kinds, name))
    }

    /// Find by name in core namespaces only, in declaration order
    pub fn find_in_core(&self, kinds: &[EntityKind], name: &str) -> Option<EntityId> {
        self.namespaces
            .iter()
            .filter(|namespace| !namespace.is_extension)
            .find_map(|namespace| namespace.find(kinds, name))
    }

    /// Closest visible name of an acceptable kind (fuzzy)
    pub fn suggest(&self, from: &str, kinds: &[EntityKind], name: &str) -> Option<String> {
        let matcher = SkimMatcherV2::default();
        let mut best: Option<(i64, &str)> = None;

        for namespace in self.visible_namespaces(from) {
            for candidate in namespace.names_of(kinds) {
                if let Some(score) = matcher.fuzzy_match(candidate, name) {
                    let better = match best {
                        Some((top, current)) => score > top || (score == top && candidate < current),
                        None => true,
                    };
                    if better {
                        best = Some((score, candidate));
                    }
                }
            }
        }

        best.map(|(_, candidate)| candidate.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> ModelRepository {
        let mut repo = ModelRepository::new();
        repo.add_namespace(Namespace::core("EdFi")).unwrap();
        repo.add_namespace(Namespace::extension("Sample", vec!["EdFi".to_string()]))
            .unwrap();
        repo.add_entity(ModelEntity::new(EntityKind::DomainEntity, "School", "EdFi"))
            .unwrap();
        repo.add_entity(ModelEntity::new(EntityKind::DomainEntity, "Bus", "Sample"))
            .unwrap();
        repo
    }

    #[test]
    fn test_duplicate_namespace_rejected() {
        let mut repo = repository();
        let result = repo.add_namespace(Namespace::core("EdFi"));
        assert!(matches!(result, Err(LinkError::DuplicateNamespace(_))));
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let mut repo = repository();
        let result = repo.add_entity(ModelEntity::new(EntityKind::DomainEntity, "School", "EdFi"));
        assert!(matches!(result, Err(LinkError::DuplicateEntity { .. })));
    }

    #[test]
    fn test_same_name_different_kind_allowed() {
        let mut repo = repository();
        let result = repo.add_entity(ModelEntity::new(EntityKind::Descriptor, "School", "EdFi"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_extension_sees_core() {
        let repo = repository();
        let lookup = repo.find_visible("Sample", &[EntityKind::DomainEntity], &TypeName::local("School"));
        assert!(lookup.found().is_some());
    }

    #[test]
    fn test_core_does_not_see_extension() {
        let repo = repository();
        let lookup = repo.find_visible("EdFi", &[EntityKind::DomainEntity], &TypeName::local("Bus"));
        assert_eq!(lookup, Lookup::NotFound);

        let qualified = repo.find_visible("EdFi", &[EntityKind::DomainEntity], &TypeName::qualified("Sample", "Bus"));
        assert_eq!(qualified, Lookup::NamespaceNotVisible("Sample".to_string()));
    }

    #[test]
    fn test_dependency_order() {
        let mut repo = ModelRepository::new();
        repo.add_namespace(Namespace::extension("Sample", vec!["EdFi".to_string()]))
            .unwrap();
        repo.add_namespace(Namespace::core("EdFi")).unwrap();
        assert_eq!(repo.dependency_order().unwrap(), vec!["EdFi", "Sample"]);
    }

    #[test]
    fn test_dependency_cycle() {
        let mut repo = ModelRepository::new();
        repo.add_namespace(Namespace::extension("A", vec!["B".to_string()])).unwrap();
        repo.add_namespace(Namespace::extension("B", vec!["A".to_string()])).unwrap();
        assert!(matches!(repo.dependency_order(), Err(LinkError::DependencyCycle(_))));
    }

    #[test]
    fn test_unknown_dependency() {
        let mut repo = ModelRepository::new();
        repo.add_namespace(Namespace::extension("A", vec!["Missing".to_string()]))
            .unwrap();
        assert!(matches!(
            repo.dependency_order(),
            Err(LinkError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_remove_entity() {
        let mut repo = repository();
        let id = repo.find_by_name(&[EntityKind::DomainEntity], "Bus").unwrap();
        assert!(repo.remove_entity(id).is_some());
        assert!(repo.entity(id).is_none());
        assert!(repo.find_by_name(&[EntityKind::DomainEntity], "Bus").is_none());
        assert_eq!(repo.entity_count(), 1);
    }

    #[test]
    fn test_find_in_core_skips_extensions_declared_first() {
        let mut repo = ModelRepository::new();
        repo.add_namespace(Namespace::extension("Sample", vec!["EdFi".to_string()]))
            .unwrap();
        repo.add_namespace(Namespace::core("EdFi")).unwrap();
        let extension = repo
            .add_entity(ModelEntity::new(EntityKind::DomainEntity, "School", "Sample"))
            .unwrap();
        let core = repo
            .add_entity(ModelEntity::new(EntityKind::DomainEntity, "School", "EdFi"))
            .unwrap();

        assert_eq!(repo.find_by_name(&[EntityKind::DomainEntity], "School"), Some(extension));
        assert_eq!(repo.find_in_core(&[EntityKind::DomainEntity], "School"), Some(core));
        assert_eq!(repo.find_in_core(&[EntityKind::DomainEntity], "Bus"), None);
    }

    #[test]
    fn test_names_of_borrowed_kinds() {
        let repo = repository();
        let kinds = vec![EntityKind::DomainEntity, EntityKind::Descriptor];
        let names: Vec<&str> = repo.namespace("EdFi").unwrap().names_of(&kinds).collect();
        assert_eq!(names, vec!["School"]);
    }

    #[test]
    fn test_suggestion() {
        let repo = repository();
        let suggestion = repo.suggest("Sample", &[EntityKind::DomainEntity], "Scool");
        assert_eq!(suggestion.as_deref(), Some("School"));
    }
}
