//! Model entities

use serde::{Deserialize, Serialize};
use std::fmt;

use super::property::Property;
use super::{EntityId, SourceMap, TypeName};

/// Kind tag of a model entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    DomainEntity,
    DomainEntitySubclass,
    DomainEntityExtension,
    Association,
    AssociationSubclass,
    AssociationExtension,
    Common,
    CommonExtension,
    InlineCommon,
    Choice,
    Descriptor,
    Enumeration,
    Interchange,
    StringType,
    IntegerType,
    DecimalType,
}

impl EntityKind {
    /// Name as used in validation messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DomainEntity => "Domain Entity",
            Self::DomainEntitySubclass => "Domain Entity Subclass",
            Self::DomainEntityExtension => "Domain Entity Extension",
            Self::Association => "Association",
            Self::AssociationSubclass => "Association Subclass",
            Self::AssociationExtension => "Association Extension",
            Self::Common => "Common",
            Self::CommonExtension => "Common Extension",
            Self::InlineCommon => "Inline Common",
            Self::Choice => "Choice",
            Self::Descriptor => "Descriptor",
            Self::Enumeration => "Enumeration",
            Self::Interchange => "Interchange",
            Self::StringType => "String Type",
            Self::IntegerType => "Integer Type",
            Self::DecimalType => "Decimal Type",
        }
    }

    /// Kinds a subclass or extension of this kind may be based on.
    /// Empty for kinds that have no base.
    pub fn base_kinds(&self) -> &'static [EntityKind] {
        match self {
            Self::DomainEntitySubclass => &[Self::DomainEntity],
            Self::AssociationSubclass => &[Self::Association],
            Self::DomainEntityExtension => &[Self::DomainEntity, Self::DomainEntitySubclass],
            Self::AssociationExtension => &[Self::Association, Self::AssociationSubclass],
            Self::CommonExtension => &[Self::Common],
            _ => &[],
        }
    }

    pub fn is_subclass(&self) -> bool {
        matches!(self, Self::DomainEntitySubclass | Self::AssociationSubclass)
    }

    pub fn is_extension(&self) -> bool {
        matches!(
            self,
            Self::DomainEntityExtension | Self::AssociationExtension | Self::CommonExtension
        )
    }

    /// Entities that get their own API resource and JSON projection
    pub fn is_top_level_resource(&self) -> bool {
        matches!(
            self,
            Self::DomainEntity
                | Self::DomainEntitySubclass
                | Self::Association
                | Self::AssociationSubclass
        )
    }

    pub fn is_simple_type(&self) -> bool {
        matches!(self, Self::StringType | Self::IntegerType | Self::DecimalType)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A named, typed model element owned by one namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntity {
    /// Arena slot, assigned by the repository
    #[serde(skip)]
    pub(crate) id: Option<EntityId>,
    pub kind: EntityKind,
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub is_abstract: bool,
    /// Simple types synthesized by the parser rather than declared
    #[serde(default)]
    pub is_implicit: bool,
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Symbolic base for subclasses and extensions
    #[serde(default)]
    pub base_name: Option<TypeName>,
    /// Filled in by the subclass linker
    #[serde(skip)]
    pub(crate) base_entity: Option<EntityId>,
    #[serde(default)]
    pub queryable_fields: Vec<String>,
    #[serde(default)]
    pub source_map: Option<SourceMap>,
}

impl ModelEntity {
    pub fn new(kind: EntityKind, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            name: name.into(),
            namespace: namespace.into(),
            documentation: String::new(),
            is_abstract: false,
            is_implicit: false,
            properties: Vec::new(),
            base_name: None,
            base_entity: None,
            queryable_fields: Vec::new(),
            source_map: None,
        }
    }

    /// Arena id; `None` until the entity is added to a repository
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Linked base entity, once the subclass linker has run
    pub fn base_entity(&self) -> Option<EntityId> {
        self.base_entity
    }

    /// `Namespace.Name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Identity properties in declaration order
    pub fn identity_properties(&self) -> impl Iterator<Item = (usize, &Property)> {
        self.properties
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyType;

    #[test]
    fn test_base_kind_pairing() {
        assert_eq!(EntityKind::DomainEntitySubclass.base_kinds(), &[EntityKind::DomainEntity]);
        assert_eq!(EntityKind::AssociationSubclass.base_kinds(), &[EntityKind::Association]);
        assert!(EntityKind::DomainEntity.base_kinds().is_empty());
    }

    #[test]
    fn test_identity_properties() {
        let mut entity = ModelEntity::new(EntityKind::DomainEntity, "School", "EdFi");
        entity.properties.push(Property::new(PropertyType::Integer, "SchoolId", "EdFi").identity());
        entity.properties.push(Property::new(PropertyType::String, "NameOfInstitution", "EdFi"));

        let identity: Vec<_> = entity.identity_properties().map(|(i, _)| i).collect();
        assert_eq!(identity, vec![0]);
        assert_eq!(entity.qualified_name(), "EdFi.School");
    }
}
