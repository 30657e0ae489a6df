//! Link Context
//!
//! The single value threaded through every pass. It owns the repository,
//! the diagnostics channel and everything the passes derive. Downstream
//! consumers read it through the accessors below once the pipeline is done.

use std::collections::{HashMap, HashSet};

use crate::diagnostics::Diagnostics;
use crate::error::{LinkError, Result};
use crate::link::merge::MergeClasses;
use crate::link::subclass::Composition;
use crate::model::{EntityId, EntityKind, ModelEntity, ModelRepository, PropertyRef};
use crate::projection::JsonPathProjection;
use crate::security::SecurableElement;
use crate::version::DataStandardVersion;

// =============================================================================
// Side Tables
// =============================================================================

/// Kind of backend data attached to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aspect {
    JsonPaths,
    EducationOrganizationSecurableElements,
}

/// Backend data for one (entity, aspect) slot
#[derive(Debug, Clone, PartialEq)]
pub enum AspectData {
    JsonPaths(JsonPathProjection),
    SecurableElements(Vec<SecurableElement>),
}

impl AspectData {
    pub fn aspect(&self) -> Aspect {
        match self {
            Self::JsonPaths(_) => Aspect::JsonPaths,
            Self::SecurableElements(_) => Aspect::EducationOrganizationSecurableElements,
        }
    }
}

/// Per-backend data keyed by (entity, aspect), kept off the shared entities
#[derive(Debug, Clone)]
pub struct SideTable {
    backend: &'static str,
    entries: HashMap<(EntityId, Aspect), AspectData>,
}

impl SideTable {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            entries: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Store data for an entity, replacing what the aspect held before
    pub fn insert(&mut self, entity: EntityId, data: AspectData) {
        self.entries.insert((entity, data.aspect()), data);
    }

    pub fn get(&self, entity: EntityId, aspect: Aspect) -> Option<&AspectData> {
        self.entries.get(&(entity, aspect))
    }

    pub fn json_paths(&self, entity: EntityId) -> Option<&JsonPathProjection> {
        match self.get(entity, Aspect::JsonPaths)? {
            AspectData::JsonPaths(projection) => Some(projection),
            _ => None,
        }
    }

    pub fn securable_elements(&self, entity: EntityId) -> Option<&[SecurableElement]> {
        match self.get(entity, Aspect::EducationOrganizationSecurableElements)? {
            AspectData::SecurableElements(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// LinkContext
// =============================================================================

const RESOURCE_KINDS: &[EntityKind] = &[
    EntityKind::DomainEntity,
    EntityKind::DomainEntitySubclass,
    EntityKind::Association,
    EntityKind::AssociationSubclass,
];

/// Everything the passes read and write
#[derive(Debug)]
pub struct LinkContext {
    pub(crate) repository: ModelRepository,
    pub(crate) diagnostics: Diagnostics,
    data_standard_version: DataStandardVersion,
    /// Composed property lists, one per entity
    pub(crate) compositions: HashMap<EntityId, Composition>,
    /// base entity -> extension overlays in link order
    pub(crate) overlays: HashMap<EntityId, Vec<EntityId>>,
    pub(crate) merge_classes: HashMap<EntityId, MergeClasses>,
    /// Properties whose failed resolution is already in the diagnostics
    pub(crate) unresolved: HashSet<PropertyRef>,
    /// API schema backend data
    pub(crate) api_schema: SideTable,
}

impl LinkContext {
    pub fn new(repository: ModelRepository, data_standard_version: DataStandardVersion) -> Self {
        Self {
            repository,
            diagnostics: Diagnostics::new(),
            data_standard_version,
            compositions: HashMap::new(),
            overlays: HashMap::new(),
            merge_classes: HashMap::new(),
            unresolved: HashSet::new(),
            api_schema: SideTable::new("api_schema"),
        }
    }

    pub fn repository(&self) -> &ModelRepository {
        &self.repository
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn data_standard_version(&self) -> &DataStandardVersion {
        &self.data_standard_version
    }

    pub fn entity(&self, id: EntityId) -> Option<&ModelEntity> {
        self.repository.entity(id)
    }

    /// Find a top-level resource (domain entity, association or subclass) by name
    pub fn find_resource(&self, name: &str) -> Option<EntityId> {
        self.repository.find_by_name(RESOURCE_KINDS, name)
    }

    /// Like [`find_resource`](Self::find_resource), ignoring extension namespaces
    pub fn find_core_resource(&self, name: &str) -> Option<EntityId> {
        self.repository.find_in_core(RESOURCE_KINDS, name)
    }

    /// The entity a property resolved to
    pub fn resolved_target(&self, property: PropertyRef) -> Option<&ModelEntity> {
        let target = self.repository.property(property)?.resolved_target()?;
        self.repository.entity(target)
    }

    /// Base entities from the immediate base up to the root
    pub fn base_chain(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.entity(id).and_then(ModelEntity::base_entity);

        while let Some(base) = current {
            if !seen.insert(base) {
                break;
            }
            chain.push(base);
            current = self.entity(base).and_then(ModelEntity::base_entity);
        }
        chain
    }

    pub fn composition(&self, id: EntityId) -> Option<&Composition> {
        self.compositions.get(&id)
    }

    pub fn extension_overlays(&self, id: EntityId) -> &[EntityId] {
        self.overlays.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn merge_classes(&self, id: EntityId) -> Option<&MergeClasses> {
        self.merge_classes.get(&id)
    }

    pub fn json_paths(&self, id: EntityId) -> Option<&JsonPathProjection> {
        self.api_schema.json_paths(id)
    }

    pub fn securable_elements(&self, id: EntityId) -> Option<&[SecurableElement]> {
        self.api_schema.securable_elements(id)
    }

    pub fn api_schema(&self) -> &SideTable {
        &self.api_schema
    }

    /// Reject the run if any pass recorded an error
    pub fn into_result(self) -> Result<Self> {
        if self.diagnostics.has_errors() {
            return Err(LinkError::ValidationFailed(self.diagnostics.error_count()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::SecurableElement;

    #[test]
    fn test_side_table_replaces_per_aspect() {
        let mut table = SideTable::new("api_schema");
        let id = EntityId(0);
        let first = vec![SecurableElement::new("$.schoolReference.schoolId", "School")];
        let second = vec![SecurableElement::new("$.reportedSchoolReference.schoolId", "ReportedSchool")];

        table.insert(id, AspectData::SecurableElements(first));
        table.insert(id, AspectData::SecurableElements(second.clone()));

        assert_eq!(table.len(), 1);
        assert_eq!(table.securable_elements(id), Some(second.as_slice()));
        assert!(table.json_paths(id).is_none());
    }
}
