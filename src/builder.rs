//! Model Builder
//!
//! Fluent construction of an unlinked model, mirroring how MetaEd source
//! declares it: open a namespace, open an entity, list its properties.
//! Opening a new entity or namespace closes the current one.
//!
//! ```
//! use metaed_linker::builder::ModelBuilder;
//!
//! let repository = ModelBuilder::new()
//!     .namespace("EdFi")
//!     .abstract_entity("EducationOrganization")
//!     .integer_identity("EducationOrganizationId")
//!     .domain_entity_subclass("School", "EducationOrganization")
//!     .identity_rename(metaed_linker::model::PropertyType::Integer, "SchoolId", "EducationOrganizationId")
//!     .build()
//!     .unwrap();
//! assert_eq!(repository.entity_count(), 2);
//! ```

use crate::error::{LinkError, Result};
use crate::model::{
    EntityKind, MergeDirective, ModelEntity, ModelRepository, Namespace, Property, PropertyType,
    SourceMap, TypeName,
};

/// Builds a [`ModelRepository`] one declaration at a time
#[derive(Debug, Default)]
pub struct ModelBuilder {
    repository: ModelRepository,
    namespace: Option<String>,
    entity: Option<ModelEntity>,
    error: Option<LinkError>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Namespaces
    // =========================================================================

    /// Open a core namespace
    pub fn namespace(self, name: &str) -> Self {
        self.open_namespace(Namespace::core(name))
    }

    /// Open an extension namespace depending on the given namespaces
    pub fn extension_namespace(self, name: &str, dependencies: &[&str]) -> Self {
        let dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self.open_namespace(Namespace::extension(name, dependencies))
    }

    fn open_namespace(mut self, namespace: Namespace) -> Self {
        self.close_entity();
        let name = namespace.name.clone();
        let result = self.repository.add_namespace(namespace);
        self.record(result);
        self.namespace = Some(name);
        self
    }

    // =========================================================================
    // Entities
    // =========================================================================

    pub fn domain_entity(self, name: &str) -> Self {
        self.open_entity(EntityKind::DomainEntity, name, None)
    }

    pub fn abstract_entity(mut self, name: &str) -> Self {
        self = self.open_entity(EntityKind::DomainEntity, name, None);
        if let Some(entity) = self.entity.as_mut() {
            entity.is_abstract = true;
        }
        self
    }

    pub fn domain_entity_subclass(self, name: &str, base: &str) -> Self {
        self.open_entity(EntityKind::DomainEntitySubclass, name, Some(base))
    }

    pub fn association(self, name: &str) -> Self {
        self.open_entity(EntityKind::Association, name, None)
    }

    pub fn association_subclass(self, name: &str, base: &str) -> Self {
        self.open_entity(EntityKind::AssociationSubclass, name, Some(base))
    }

    pub fn common(self, name: &str) -> Self {
        self.open_entity(EntityKind::Common, name, None)
    }

    pub fn inline_common(self, name: &str) -> Self {
        self.open_entity(EntityKind::InlineCommon, name, None)
    }

    pub fn choice(self, name: &str) -> Self {
        self.open_entity(EntityKind::Choice, name, None)
    }

    pub fn descriptor(self, name: &str) -> Self {
        self.open_entity(EntityKind::Descriptor, name, None)
    }

    pub fn enumeration(self, name: &str) -> Self {
        self.open_entity(EntityKind::Enumeration, name, None)
    }

    /// Extension overlay of a domain entity; named after its base
    pub fn domain_entity_extension(self, base: &str) -> Self {
        let name = TypeName::parse(base).name;
        self.open_entity(EntityKind::DomainEntityExtension, &name, Some(base))
    }

    pub fn association_extension(self, base: &str) -> Self {
        let name = TypeName::parse(base).name;
        self.open_entity(EntityKind::AssociationExtension, &name, Some(base))
    }

    pub fn common_extension(self, base: &str) -> Self {
        let name = TypeName::parse(base).name;
        self.open_entity(EntityKind::CommonExtension, &name, Some(base))
    }

    /// A simple type (`StringType`, `IntegerType`, `DecimalType`)
    pub fn simple_type(mut self, kind: EntityKind, name: &str, implicit: bool) -> Self {
        self = self.open_entity(kind, name, None);
        if let Some(entity) = self.entity.as_mut() {
            entity.is_implicit = implicit;
        }
        self
    }

    fn open_entity(mut self, kind: EntityKind, name: &str, base: Option<&str>) -> Self {
        self.close_entity();
        let namespace = self.namespace.clone().unwrap_or_default();
        let mut entity = ModelEntity::new(kind, name, namespace);
        entity.base_name = base.map(TypeName::parse);
        self.entity = Some(entity);
        self
    }

    fn close_entity(&mut self) {
        if let Some(entity) = self.entity.take() {
            let result = self.repository.add_entity(entity).map(|_| ());
            self.record(result);
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Add a fully built property to the open entity
    pub fn property(mut self, property: Property) -> Self {
        if let Some(entity) = self.entity.as_mut() {
            entity.properties.push(property);
        }
        self
    }

    /// A property of the open namespace; referential names may be qualified
    pub fn new_property(&self, property_type: PropertyType, name: &str) -> Property {
        let namespace = self.namespace.clone().unwrap_or_default();
        let property = Property::new(property_type, name, namespace);
        if property_type.is_referential() {
            property.targeting(name)
        } else {
            property
        }
    }

    pub fn identity(self, property_type: PropertyType, name: &str, role: &str) -> Self {
        let property = self.new_property(property_type, name).with_role(role).identity();
        self.property(property)
    }

    pub fn required(self, property_type: PropertyType, name: &str, role: &str) -> Self {
        let property = self.new_property(property_type, name).with_role(role).required();
        self.property(property)
    }

    pub fn optional(self, property_type: PropertyType, name: &str, role: &str) -> Self {
        let property = self.new_property(property_type, name).with_role(role);
        self.property(property)
    }

    pub fn collection(self, property_type: PropertyType, name: &str, role: &str) -> Self {
        let property = self.new_property(property_type, name).with_role(role).collection();
        self.property(property)
    }

    pub fn integer_identity(self, name: &str) -> Self {
        self.identity(PropertyType::Integer, name, "")
    }

    pub fn string_identity(self, name: &str) -> Self {
        self.identity(PropertyType::String, name, "")
    }

    pub fn descriptor_identity(self, name: &str) -> Self {
        self.identity(PropertyType::Descriptor, name, "")
    }

    pub fn string_property(self, name: &str) -> Self {
        self.optional(PropertyType::String, name, "")
    }

    pub fn integer_property(self, name: &str) -> Self {
        self.optional(PropertyType::Integer, name, "")
    }

    pub fn domain_entity_identity(self, target: &str, role: &str) -> Self {
        self.identity(PropertyType::DomainEntity, target, role)
    }

    pub fn domain_entity_property(self, target: &str, role: &str) -> Self {
        self.optional(PropertyType::DomainEntity, target, role)
    }

    pub fn association_identity(self, target: &str, role: &str) -> Self {
        self.identity(PropertyType::Association, target, role)
    }

    /// Subclass property renaming a base identity property
    pub fn identity_rename(self, property_type: PropertyType, name: &str, renames: &str) -> Self {
        let property = self.new_property(property_type, name).renaming(renames);
        self.property(property)
    }

    /// Attach a merge directive to the last property added
    pub fn merge(mut self, source_path: &str, target_path: &str) -> Self {
        if let Some(property) = self.entity.as_mut().and_then(|e| e.properties.last_mut()) {
            property.merge_directives.push(MergeDirective::new(source_path, target_path));
        }
        self
    }

    /// Attach a source location to the last property, or the entity if it has none
    pub fn at(mut self, line: u32, column: u32, token_text: &str) -> Self {
        let source_map = SourceMap::new(line, column, token_text);
        if let Some(entity) = self.entity.as_mut() {
            match entity.properties.last_mut() {
                Some(property) => property.source_map = Some(source_map),
                None => entity.source_map = Some(source_map),
            }
        }
        self
    }

    pub fn queryable(mut self, field: &str) -> Self {
        if let Some(entity) = self.entity.as_mut() {
            entity.queryable_fields.push(field.to_string());
        }
        self
    }

    // =========================================================================
    // Finish
    // =========================================================================

    /// Close everything and return the repository, or the first error hit
    pub fn build(mut self) -> Result<ModelRepository> {
        self.close_entity();
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.repository),
        }
    }

    fn record(&mut self, result: Result<()>) {
        if let Err(error) = result {
            self.error.get_or_insert(error);
        }
    }
}
