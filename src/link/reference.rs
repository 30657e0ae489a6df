//! Reference Resolver
//!
//! Resolves every referential property's symbolic target to an entity in a
//! namespace visible from the declaring namespace. Failures become
//! diagnostics; the property stays unresolved.

use crate::context::LinkContext;
use crate::diagnostics::{FailureCode, ValidationFailure};
use crate::error::{LinkError, Result};
use crate::model::{EntityId, Lookup, Property, PropertyRef, TypeName};
use crate::pipeline::{LinkedField, Pass};

const NAME: &str = "ReferenceResolver";

/// Resolves property targets; idempotent
pub struct ReferenceResolver;

/// A lookup computed against the immutable repository, applied afterwards
struct Pending {
    index: usize,
    target: TypeName,
    lookup: Lookup,
}

impl Pass for ReferenceResolver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reads(&self) -> &'static [LinkedField] {
        &[LinkedField::Syntax, LinkedField::SimpleTypes]
    }

    fn writes(&self) -> &'static [LinkedField] {
        &[LinkedField::ResolvedTargets]
    }

    fn run(&self, context: &mut LinkContext) -> Result<()> {
        let mut resolved = 0usize;

        for id in context.repository.entities_in_order()? {
            let pending = pending_lookups(context, id);

            for Pending { index, target, lookup } in pending {
                match lookup {
                    Lookup::Found(target_id) => {
                        let Some(property) = context
                            .repository
                            .entity_mut(id)
                            .and_then(|e| e.properties.get_mut(index))
                        else {
                            continue;
                        };
                        assign(property, target_id)?;
                        resolved += 1;
                    }
                    Lookup::NotFound => {
                        report_not_found(context, id, index, &target);
                        context.unresolved.insert(PropertyRef::new(id, index));
                    }
                    Lookup::NamespaceNotVisible(namespace) => {
                        report_not_visible(context, id, index, &target, &namespace);
                        context.unresolved.insert(PropertyRef::new(id, index));
                    }
                }
            }
        }

        tracing::info!(resolved, "resolved property references");
        Ok(())
    }
}

fn pending_lookups(context: &LinkContext, id: EntityId) -> Vec<Pending> {
    let Some(entity) = context.repository.entity(id) else {
        return Vec::new();
    };

    entity
        .properties
        .iter()
        .enumerate()
        .filter(|(_, p)| p.resolved.is_none())
        .filter(|(index, _)| !context.unresolved.contains(&PropertyRef::new(id, *index)))
        .filter_map(|(index, property)| {
            let target = property.target.clone()?;
            let kinds = property.property_type.candidate_kinds();
            if kinds.is_empty() {
                return None;
            }
            let lookup = context
                .repository
                .find_visible(&property.declaring_namespace, kinds, &target);
            Some(Pending { index, target, lookup })
        })
        .collect()
}

/// Set a resolved target exactly once
fn assign(property: &mut Property, target: EntityId) -> Result<()> {
    match property.resolved {
        Some(existing) if existing != target => Err(LinkError::InvariantViolation {
            stage: NAME,
            message: format!(
                "property '{}' already resolved to {} and cannot be re-resolved to {}",
                property.full_name(),
                existing,
                target
            ),
        }),
        _ => {
            property.resolved = Some(target);
            Ok(())
        }
    }
}

fn report_not_found(context: &mut LinkContext, id: EntityId, index: usize, target: &TypeName) {
    let Some(entity) = context.repository.entity(id) else {
        return;
    };
    let Some(property) = entity.properties.get(index) else {
        return;
    };

    let kinds = property.property_type.candidate_kinds();
    let mut message = format!(
        "{} '{}' property '{}' does not match any declared {} visible from namespace {}.",
        entity.kind,
        entity.name,
        property.full_name(),
        property.property_type,
        property.declaring_namespace
    );
    if let Some(suggestion) = context
        .repository
        .suggest(&property.declaring_namespace, kinds, &target.name)
    {
        message.push_str(&format!(" Did you mean '{}'?", suggestion));
    }

    let failure = ValidationFailure::new(NAME, FailureCode::UnresolvedReference, message)
        .on_entity(entity.qualified_name())
        .at(property.source_map.as_ref());
    context.diagnostics.push(failure);
}

fn report_not_visible(
    context: &mut LinkContext,
    id: EntityId,
    index: usize,
    target: &TypeName,
    namespace: &str,
) {
    let Some(entity) = context.repository.entity(id) else {
        return;
    };
    let Some(property) = entity.properties.get(index) else {
        return;
    };

    let message = format!(
        "{} '{}' property '{}' references '{}' but namespace {} is not visible from namespace {}.",
        entity.kind,
        entity.name,
        property.full_name(),
        target,
        namespace,
        property.declaring_namespace
    );
    let failure = ValidationFailure::new(NAME, FailureCode::NamespaceNotVisible, message)
        .on_entity(entity.qualified_name())
        .at(property.source_map.as_ref());
    context.diagnostics.push(failure);
}
