//! Subclass/Base-Entity Linker
//!
//! Links subclasses and extension overlays to their bases, then composes
//! each entity's property list: the base's composed list in base-declaration
//! order followed by the entity's own properties.
//!
//! Identity renames keep the renamed base property in the list, marked with
//! the renaming property, so that counts stay the sum of each ancestor's own
//! properties. Consumers that project documents skip renamed properties.

use serde::Serialize;
use std::collections::HashMap;

use crate::context::LinkContext;
use crate::diagnostics::{Diagnostics, FailureCode, ValidationFailure};
use crate::error::{LinkError, Result};
use crate::model::{EntityId, Lookup, ModelEntity, ModelRepository, Property, PropertyRef};
use crate::pipeline::{LinkedField, Pass};

const NAME: &str = "SubclassLinker";

// =============================================================================
// Composition
// =============================================================================

/// One entry of a composed property list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedProperty {
    pub property: PropertyRef,
    /// Ancestor that declared it; `None` for own properties
    pub inherited_from: Option<EntityId>,
    /// Identity rename that replaces this property
    pub renamed_by: Option<PropertyRef>,
}

impl ComposedProperty {
    fn own(property: PropertyRef) -> Self {
        Self {
            property,
            inherited_from: None,
            renamed_by: None,
        }
    }

    pub fn is_inherited(&self) -> bool {
        self.inherited_from.is_some()
    }

    pub fn is_renamed_away(&self) -> bool {
        self.renamed_by.is_some()
    }
}

/// An entity's own plus inherited properties and queryable fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Composition {
    pub properties: Vec<ComposedProperty>,
    pub queryable_fields: Vec<String>,
}

impl Composition {
    /// Properties that appear in documents: everything not renamed away
    pub fn effective(&self) -> impl Iterator<Item = &ComposedProperty> {
        self.properties.iter().filter(|p| !p.is_renamed_away())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

// =============================================================================
// Linker Pass
// =============================================================================

/// Links bases and overlays, then composes every entity
pub struct SubclassLinker;

impl Pass for SubclassLinker {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reads(&self) -> &'static [LinkedField] {
        &[LinkedField::Syntax, LinkedField::ResolvedTargets]
    }

    fn writes(&self) -> &'static [LinkedField] {
        &[
            LinkedField::BaseEntities,
            LinkedField::ExtensionOverlays,
            LinkedField::Compositions,
        ]
    }

    fn run(&self, context: &mut LinkContext) -> Result<()> {
        let order = context.repository.entities_in_order()?;

        // Phase 1: link bases and overlays
        for &id in &order {
            link_base(context, id);
        }

        // Phase 2: compose, bases before subclasses
        let mut visiting = Vec::new();
        for &id in &order {
            compose(context, id, &mut visiting)?;
        }

        tracing::info!(
            composed = context.compositions.len(),
            overlays = context.overlays.values().map(Vec::len).sum::<usize>(),
            "linked base entities"
        );
        Ok(())
    }
}

fn link_base(context: &mut LinkContext, id: EntityId) {
    let Some(entity) = context.repository.entity(id) else {
        return;
    };
    let kinds = entity.kind.base_kinds();
    if kinds.is_empty() || entity.base_entity.is_some() {
        return;
    }
    let base_display = kinds[0].display_name();

    let lookup = match &entity.base_name {
        Some(base_name) => context
            .repository
            .find_visible(&entity.namespace, kinds, base_name),
        None => Lookup::NotFound,
    };

    match lookup {
        Lookup::Found(base) => {
            let is_extension = entity.kind.is_extension();
            if let Some(entity) = context.repository.entity_mut(id) {
                entity.base_entity = Some(base);
            }
            if is_extension {
                context.overlays.entry(base).or_default().push(id);
            }
        }
        Lookup::NotFound | Lookup::NamespaceNotVisible(_) => {
            let base_name = entity
                .base_name
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            let message = format!(
                "{} '{}' based on '{}' does not match a valid {}.",
                entity.kind, entity.name, base_name, base_display
            );
            let failure = ValidationFailure::new(NAME, FailureCode::BaseNotFound, message)
                .on_entity(entity.qualified_name())
                .at(entity.source_map.as_ref());
            context.diagnostics.push(failure);
        }
    }
}

fn compose(context: &mut LinkContext, id: EntityId, visiting: &mut Vec<EntityId>) -> Result<()> {
    if context.compositions.contains_key(&id) {
        return Ok(());
    }
    let Some(entity) = context.repository.entity(id) else {
        return Ok(());
    };
    let base = entity.base_entity.filter(|_| entity.kind.is_subclass());

    let mut composition = Composition::default();

    if let Some(base) = base {
        if base == id || visiting.contains(&base) {
            return Err(LinkError::InvariantViolation {
                stage: NAME,
                message: format!("base entity chain of '{}' loops back on itself", entity.qualified_name()),
            });
        }
        visiting.push(id);
        compose(context, base, visiting)?;
        visiting.pop();

        if let Some(inherited) = context.compositions.get(&base) {
            composition.properties = inherited
                .properties
                .iter()
                .map(|p| ComposedProperty {
                    inherited_from: Some(p.inherited_from.unwrap_or(base)),
                    ..p.clone()
                })
                .collect();
            composition.queryable_fields = inherited.queryable_fields.clone();
        }
    }

    let repository = &context.repository;
    let diagnostics = &mut context.diagnostics;
    if let Some(entity) = repository.entity(id) {
        add_own_properties(repository, diagnostics, entity, id, base, &mut composition);
    }
    context.compositions.insert(id, composition);
    Ok(())
}

fn add_own_properties(
    repository: &ModelRepository,
    diagnostics: &mut Diagnostics,
    entity: &ModelEntity,
    id: EntityId,
    base: Option<EntityId>,
    composition: &mut Composition,
) {
    let base_name = base
        .and_then(|b| repository.entity(b))
        .map(|b| b.name.clone())
        .unwrap_or_default();
    let fail = |code: FailureCode, message: String, property: &Property| {
        ValidationFailure::new(NAME, code, message)
            .on_entity(entity.qualified_name())
            .at(property.source_map.as_ref())
    };

    // full name -> index into composition.properties, inherited only
    let inherited: HashMap<String, usize> = composition
        .properties
        .iter()
        .enumerate()
        .filter_map(|(i, p)| Some((repository.property(p.property)?.full_name(), i)))
        .collect();

    for (index, property) in entity.properties.iter().enumerate() {
        let own = PropertyRef::new(id, index);
        let full_name = property.full_name();

        if let Some(renamed) = &property.identity_rename {
            if !entity.kind.is_subclass() {
                let message = format!(
                    "{} '{}' declares identity rename of {} but is not a subclass.",
                    entity.kind, entity.name, renamed
                );
                diagnostics.push(fail(FailureCode::RenameOutsideSubclass, message, property));
                composition.properties.push(ComposedProperty::own(own));
                continue;
            }

            let target = inherited.get(renamed).copied().filter(|&i| {
                repository
                    .property(composition.properties[i].property)
                    .map(|p| p.is_identity)
                    .unwrap_or(false)
            });

            match target {
                None => {
                    let message = format!(
                        "{} '{}' based on '{}' tries to rename {} which is not part of the identity.",
                        entity.kind, entity.name, base_name, renamed
                    );
                    diagnostics.push(fail(FailureCode::RenameNotIdentity, message, property));
                }
                Some(i) if composition.properties[i].is_renamed_away() => {
                    let message = format!(
                        "{} '{}' based on '{}' renames identity property {} more than once.",
                        entity.kind, entity.name, base_name, renamed
                    );
                    diagnostics.push(fail(FailureCode::DuplicateRename, message, property));
                }
                Some(i) => {
                    let preserved = repository
                        .property(composition.properties[i].property)
                        .map(|base_property| {
                            base_property.property_type == property.property_type
                                && base_property.is_collection == property.is_collection
                        })
                        .unwrap_or(false);
                    if preserved {
                        composition.properties[i].renamed_by = Some(own);
                    } else {
                        let message = format!(
                            "{} '{}' based on '{}' renames identity property {} with a property of a different type or cardinality.",
                            entity.kind, entity.name, base_name, renamed
                        );
                        diagnostics.push(fail(FailureCode::RenameTypeMismatch, message, property));
                    }
                }
            }
            composition.properties.push(ComposedProperty::own(own));
            continue;
        }

        if let Some(&i) = inherited.get(&full_name) {
            let owner = composition.properties[i]
                .inherited_from
                .and_then(|o| repository.entity(o))
                .map(|o| o.name.clone())
                .unwrap_or_default();
            let message = format!(
                "{} '{}' based on '{}' redeclares property {} already inherited from '{}'.",
                entity.kind, entity.name, base_name, full_name, owner
            );
            diagnostics.push(fail(FailureCode::RedeclaredProperty, message, property));
            continue;
        }

        composition.properties.push(ComposedProperty::own(own));
    }

    for field in &entity.queryable_fields {
        if !composition.queryable_fields.contains(field) {
            composition.queryable_fields.push(field.clone());
        }
    }
}

// =============================================================================
// Terminal Validator
// =============================================================================

/// Rejects the run if a subclass or extension never got its base linked
pub struct SubclassBaseValidator;

impl Pass for SubclassBaseValidator {
    fn name(&self) -> &'static str {
        "SubclassBaseValidator"
    }

    fn reads(&self) -> &'static [LinkedField] {
        &[LinkedField::BaseEntities]
    }

    fn writes(&self) -> &'static [LinkedField] {
        &[]
    }

    fn run(&self, context: &mut LinkContext) -> Result<()> {
        let mut unlinked = Vec::new();

        for id in context.repository.entities_in_order()? {
            let Some(entity) = context.repository.entity(id) else {
                continue;
            };
            if entity.kind.base_kinds().is_empty() || entity.base_entity.is_some() {
                continue;
            }
            let qualified = entity.qualified_name();
            let reported = context
                .diagnostics
                .with_code(FailureCode::BaseNotFound)
                .any(|f| f.entity.as_deref() == Some(qualified.as_str()));
            if !reported {
                let message = format!("{} '{}' has no linked base entity.", entity.kind, entity.name);
                unlinked.push(
                    ValidationFailure::new(self.name(), FailureCode::BaseNotLinked, message)
                        .on_entity(qualified)
                        .at(entity.source_map.as_ref()),
                );
            }
        }

        for failure in unlinked {
            context.diagnostics.push(failure);
        }
        Ok(())
    }
}
