//! Duplicate Simple Type Diminisher
//!
//! Extension overlays re-declare shared simple properties, which makes the
//! parser synthesize implicit simple types that already exist in core. Those
//! duplicates are removed before references are resolved, so extension
//! properties resolve to the core type. This is the only pass that removes
//! entities.

use crate::context::LinkContext;
use crate::diagnostics::{FailureCode, ValidationFailure};
use crate::error::Result;
use crate::model::EntityId;
use crate::pipeline::{LinkedField, Pass};

const NAME: &str = "DuplicateSimpleTypeDiminisher";

pub struct DuplicateSimpleTypeDiminisher;

impl Pass for DuplicateSimpleTypeDiminisher {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reads(&self) -> &'static [LinkedField] {
        &[LinkedField::Syntax]
    }

    fn writes(&self) -> &'static [LinkedField] {
        &[LinkedField::SimpleTypes]
    }

    fn run(&self, context: &mut LinkContext) -> Result<()> {
        let duplicates = find_duplicates(context)?;

        for (id, kept_in) in duplicates {
            let Some(entity) = context.repository.remove_entity(id) else {
                continue;
            };
            let message = format!(
                "Implicit {} '{}' in namespace {} duplicates the one in namespace {} and was removed.",
                entity.kind, entity.name, entity.namespace, kept_in
            );
            context.diagnostics.push(
                ValidationFailure::new(NAME, FailureCode::DuplicateSimpleTypeRemoved, message)
                    .on_entity(entity.qualified_name()),
            );
        }
        Ok(())
    }
}

/// Implicit simple types of extension namespaces that a dependency already declares
fn find_duplicates(context: &LinkContext) -> Result<Vec<(EntityId, String)>> {
    let repository = &context.repository;
    let mut duplicates = Vec::new();

    for namespace_name in repository.dependency_order()? {
        let Some(namespace) = repository.namespace(&namespace_name) else {
            continue;
        };
        if !namespace.is_extension {
            continue;
        }

        for &id in namespace.entity_ids() {
            let Some(entity) = repository.entity(id) else {
                continue;
            };
            if !entity.kind.is_simple_type() || !entity.is_implicit {
                continue;
            }

            let kept_in = namespace
                .dependencies
                .iter()
                .filter_map(|d| repository.namespace(d))
                .find(|d| d.find(&[entity.kind], &entity.name).is_some());
            if let Some(dependency) = kept_in {
                duplicates.push((id, dependency.name.clone()));
            }
        }
    }

    Ok(duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;
    use crate::model::{EntityKind, PropertyRef, PropertyType};
    use crate::link::ReferenceResolver;
    use crate::version::DataStandardVersion;

    fn context() -> LinkContext {
        let repository = ModelBuilder::new()
            .namespace("EdFi")
            .simple_type(EntityKind::StringType, "Name", false)
            .extension_namespace("Sample", &["EdFi"])
            .simple_type(EntityKind::StringType, "Name", true)
            .simple_type(EntityKind::StringType, "BusRoute", true)
            .domain_entity("Bus")
            .string_identity("BusId")
            .optional(PropertyType::SharedString, "Name", "")
            .build()
            .unwrap();
        LinkContext::new(repository, DataStandardVersion::parse("5.0.0").unwrap())
    }

    #[test]
    fn test_removes_only_duplicates() {
        let mut ctx = context();
        DuplicateSimpleTypeDiminisher.run(&mut ctx).unwrap();

        let sample = ctx.repository().namespace("Sample").unwrap();
        assert!(sample.find(&[EntityKind::StringType], "Name").is_none());
        assert!(sample.find(&[EntityKind::StringType], "BusRoute").is_some());
        assert_eq!(ctx.diagnostics().warning_count(), 1);
        assert!(!ctx.diagnostics().has_errors());
    }

    #[test]
    fn test_extension_property_resolves_to_core_type() {
        let mut ctx = context();
        DuplicateSimpleTypeDiminisher.run(&mut ctx).unwrap();
        ReferenceResolver.run(&mut ctx).unwrap();

        let bus = ctx.find_resource("Bus").unwrap();
        let target = ctx.resolved_target(PropertyRef::new(bus, 1)).unwrap();
        assert_eq!(target.namespace, "EdFi");
    }
}
