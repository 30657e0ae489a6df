//! Entity properties and merge directives

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::EntityKind;
use super::{EntityId, SourceMap, TypeName};
use crate::naming::prefixed_name;

// =============================================================================
// Property Types
// =============================================================================

/// Primitive value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarType {
    Boolean,
    Currency,
    Date,
    Datetime,
    Decimal,
    Duration,
    Integer,
    Percent,
    Short,
    String,
    Time,
    Year,
}

/// Whether a property carries a value or points at another entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyCategory {
    Scalar,
    Reference,
}

/// The declared type of a property, as the parser reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Boolean,
    Currency,
    Date,
    Datetime,
    Decimal,
    Duration,
    Integer,
    Percent,
    Short,
    String,
    Time,
    Year,
    DomainEntity,
    Association,
    Descriptor,
    Enumeration,
    Common,
    InlineCommon,
    Choice,
    SharedString,
    SharedInteger,
    SharedDecimal,
}

impl PropertyType {
    pub fn category(&self) -> PropertyCategory {
        if self.candidate_kinds().is_empty() {
            PropertyCategory::Scalar
        } else {
            PropertyCategory::Reference
        }
    }

    pub fn is_referential(&self) -> bool {
        self.category() == PropertyCategory::Reference
    }

    /// References that project as a `...Reference` object
    pub fn is_entity_reference(&self) -> bool {
        matches!(self, Self::DomainEntity | Self::Association)
    }

    /// Entity kinds a reference of this type may resolve to
    pub fn candidate_kinds(&self) -> &'static [EntityKind] {
        match self {
            Self::DomainEntity => &[EntityKind::DomainEntity, EntityKind::DomainEntitySubclass],
            Self::Association => &[EntityKind::Association, EntityKind::AssociationSubclass],
            Self::Descriptor => &[EntityKind::Descriptor],
            Self::Enumeration => &[EntityKind::Enumeration],
            Self::Common => &[EntityKind::Common],
            Self::InlineCommon => &[EntityKind::InlineCommon],
            Self::Choice => &[EntityKind::Choice],
            Self::SharedString => &[EntityKind::StringType],
            Self::SharedInteger => &[EntityKind::IntegerType],
            Self::SharedDecimal => &[EntityKind::DecimalType],
            _ => &[],
        }
    }

    /// Primitive carried by scalars and shared simple types
    pub fn scalar_type(&self) -> Option<ScalarType> {
        let scalar = match self {
            Self::Boolean => ScalarType::Boolean,
            Self::Currency => ScalarType::Currency,
            Self::Date => ScalarType::Date,
            Self::Datetime => ScalarType::Datetime,
            Self::Decimal | Self::SharedDecimal => ScalarType::Decimal,
            Self::Duration => ScalarType::Duration,
            Self::Integer | Self::SharedInteger => ScalarType::Integer,
            Self::Percent => ScalarType::Percent,
            Self::Short => ScalarType::Short,
            Self::String | Self::SharedString => ScalarType::String,
            Self::Time => ScalarType::Time,
            Self::Year => ScalarType::Year,
            _ => return None,
        };
        Some(scalar)
    }

    /// Human-readable name used in messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DomainEntity => "domain entity",
            Self::Association => "association",
            Self::Descriptor => "descriptor",
            Self::Enumeration => "enumeration",
            Self::Common => "common",
            Self::InlineCommon => "inline common",
            Self::Choice => "choice",
            Self::SharedString => "shared string",
            Self::SharedInteger => "shared integer",
            Self::SharedDecimal => "shared decimal",
            _ => "scalar",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// =============================================================================
// Merge Directives
// =============================================================================

/// Declares that two property paths of the owning entity denote the same value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeDirective {
    pub source_path: Vec<String>,
    pub target_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<SourceMap>,
}

impl MergeDirective {
    /// Build from dotted paths, e.g. `Session.School` and `School`
    pub fn new(source_path: &str, target_path: &str) -> Self {
        Self {
            source_path: split_path(source_path),
            target_path: split_path(target_path),
            source_map: None,
        }
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Property
// =============================================================================

/// A property declared on an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// MetaEd name (for references, the referenced entity's name)
    pub name: String,
    pub property_type: PropertyType,
    pub declaring_namespace: String,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_collection: bool,
    /// Base identity property this one renames, on subclasses only
    #[serde(default)]
    pub identity_rename: Option<String>,
    /// Symbolic target, set for referential types
    #[serde(default)]
    pub target: Option<TypeName>,
    /// Filled in by the reference resolver
    #[serde(skip)]
    pub(crate) resolved: Option<EntityId>,
    #[serde(default)]
    pub merge_directives: Vec<MergeDirective>,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub source_map: Option<SourceMap>,
}

impl Property {
    /// A property of any type. Referential types target their own name.
    pub fn new(property_type: PropertyType, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let name = name.into();
        let target = property_type
            .is_referential()
            .then(|| TypeName::local(name.clone()));
        Self {
            name,
            property_type,
            declaring_namespace: namespace.into(),
            role_name: None,
            is_identity: false,
            is_required: false,
            is_collection: false,
            identity_rename: None,
            target,
            resolved: None,
            merge_directives: Vec::new(),
            documentation: String::new(),
            source_map: None,
        }
    }

    /// Point a referential property at a (possibly qualified) target.
    /// The property name follows the target's simple name.
    pub fn targeting(mut self, target: impl Into<TypeName>) -> Self {
        let target = target.into();
        self.name = target.name.clone();
        self.target = Some(target);
        self
    }

    pub fn with_role(mut self, role_name: impl Into<String>) -> Self {
        let role_name = role_name.into();
        self.role_name = (!role_name.is_empty()).then_some(role_name);
        self
    }

    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self.is_required = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    pub fn renaming(mut self, base_property: impl Into<String>) -> Self {
        self.identity_rename = Some(base_property.into());
        self.identity()
    }

    pub fn with_merge(mut self, directive: MergeDirective) -> Self {
        self.merge_directives.push(directive);
        self
    }

    pub fn with_source_map(mut self, source_map: SourceMap) -> Self {
        self.source_map = Some(source_map);
        self
    }

    pub fn category(&self) -> PropertyCategory {
        self.property_type.category()
    }

    /// Role name plus MetaEd name, collapsed when they are equal
    pub fn full_name(&self) -> String {
        prefixed_name(self.role_name.as_deref(), &self.name)
    }

    /// Resolved target, once the reference resolver has run
    pub fn resolved_target(&self) -> Option<EntityId> {
        self.resolved
    }

    pub fn is_optional(&self) -> bool {
        !self.is_required && !self.is_identity
    }
}
