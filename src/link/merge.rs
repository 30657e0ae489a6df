//! Merge Directive Resolver
//!
//! A merge directive declares that two property paths of the same entity
//! denote one value (e.g. `merge Session.School with School`). Directives
//! are validated, then unioned into equivalence classes keyed by
//! `(owning entity, full path)`. Each class exposes one representative
//! path: the one with the fewest segments, ties broken lexically.
//!
//! Path walking rules:
//! - the first source segment names the property carrying the directive
//! - segments after the first name identity properties of the entity the
//!   previous segment references
//! - intermediate segments must be resolved entity references

use serde::Serialize;
use std::collections::HashMap;

use super::disjoint_set::DisjointSet;
use crate::context::LinkContext;
use crate::diagnostics::{FailureCode, ValidationFailure};
use crate::error::Result;
use crate::model::{EntityId, MergeDirective, ModelEntity, Property, PropertyRef, PropertyType, ScalarType};
use crate::pipeline::{LinkedField, Pass};

const NAME: &str = "MergeDirectiveResolver";

/// Property full names from the owning entity down to a leaf
pub type PropertyPath = Vec<String>;

// =============================================================================
// Leaves
// =============================================================================

/// What a merge path ends on; both sides of a merge must agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LeafType {
    Scalar(ScalarType),
    Descriptor(EntityId),
    Enumeration(EntityId),
    Entity(EntityId),
    Common(EntityId),
}

impl LeafType {
    /// `None` while a referential property is unresolved
    pub fn of(property: &Property) -> Option<Self> {
        if let Some(scalar) = property.property_type.scalar_type() {
            return Some(Self::Scalar(scalar));
        }
        let target = property.resolved_target()?;
        let leaf = match property.property_type {
            PropertyType::Descriptor => Self::Descriptor(target),
            PropertyType::Enumeration => Self::Enumeration(target),
            PropertyType::DomainEntity | PropertyType::Association => Self::Entity(target),
            _ => Self::Common(target),
        };
        Some(leaf)
    }
}

/// A walked path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLeaf {
    pub property: PropertyRef,
    pub leaf_type: Option<LeafType>,
    /// Any segment along the way is a collection
    pub is_collection: bool,
}

/// Walk property full names from `root`. On failure, returns the index of the
/// segment that could not be resolved.
pub fn walk_path(context: &LinkContext, root: EntityId, segments: &[String]) -> std::result::Result<PathLeaf, usize> {
    if segments.is_empty() {
        return Err(0);
    }

    let mut current = root;
    let mut is_collection = false;

    for (i, segment) in segments.iter().enumerate() {
        let composition = context.composition(current).ok_or(i)?;
        let (property_ref, property) = composition
            .effective()
            .find_map(|composed| {
                let property = context.repository.property(composed.property)?;
                let matches = property.full_name() == *segment && (i == 0 || property.is_identity);
                matches.then_some((composed.property, property))
            })
            .ok_or(i)?;

        is_collection |= property.is_collection;

        if i + 1 == segments.len() {
            return Ok(PathLeaf {
                property: property_ref,
                leaf_type: LeafType::of(property),
                is_collection,
            });
        }

        if !property.property_type.is_entity_reference() {
            return Err(i + 1);
        }
        current = property.resolved_target().ok_or(i + 1)?;
    }

    Err(segments.len())
}

// =============================================================================
// Equivalence Classes
// =============================================================================

/// Paths of one entity known to hold the same value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeClass {
    /// Members in first-seen order
    pub members: Vec<PropertyPath>,
    pub representative: PropertyPath,
    pub leaf_type: LeafType,
    pub is_collection: bool,
}

impl MergeClass {
    /// Members collapsed onto the representative
    pub fn merged_away(&self) -> impl Iterator<Item = &PropertyPath> {
        self.members.iter().filter(move |m| **m != self.representative)
    }
}

/// All classes of one entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeClasses {
    pub classes: Vec<MergeClass>,
}

impl MergeClasses {
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergeClass> {
        self.classes.iter()
    }

    /// The class whose merged-away member is a prefix of `path`, with that member
    pub fn covering(&self, path: &[String]) -> Option<(&MergeClass, &PropertyPath)> {
        self.classes.iter().find_map(|class| {
            class
                .merged_away()
                .find(|member| path.starts_with(member))
                .map(|member| (class, member))
        })
    }
}

fn class_key(entity: &ModelEntity, path: &[String]) -> String {
    format!("{}:{}", entity.qualified_name(), path.join("."))
}

// =============================================================================
// Resolver Pass
// =============================================================================

pub struct MergeDirectiveResolver;

struct Located {
    property_name: String,
    directive: MergeDirective,
}

impl Pass for MergeDirectiveResolver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reads(&self) -> &'static [LinkedField] {
        &[LinkedField::ResolvedTargets, LinkedField::Compositions]
    }

    fn writes(&self) -> &'static [LinkedField] {
        &[LinkedField::EquivalenceClasses]
    }

    fn run(&self, context: &mut LinkContext) -> Result<()> {
        let mut total = 0usize;

        for id in context.repository.entities_in_order()? {
            let Some(entity) = context.repository.entity(id) else {
                continue;
            };
            let directives: Vec<Located> = entity
                .properties
                .iter()
                .flat_map(|p| {
                    p.merge_directives.iter().map(move |d| Located {
                        property_name: p.full_name(),
                        directive: d.clone(),
                    })
                })
                .collect();
            if directives.is_empty() {
                continue;
            }

            let (classes, failures) = resolve_entity(context, id, entity, &directives);
            total += classes.len();
            for failure in failures {
                context.diagnostics.push(failure);
            }
            if !classes.is_empty() {
                context.merge_classes.insert(id, classes);
            }
        }

        tracing::info!(classes = total, "resolved merge directives");
        Ok(())
    }
}

fn resolve_entity(
    context: &LinkContext,
    id: EntityId,
    entity: &ModelEntity,
    directives: &[Located],
) -> (MergeClasses, Vec<ValidationFailure>) {
    let mut failures = Vec::new();
    let mut set = DisjointSet::new();
    let mut members: HashMap<String, (PropertyPath, LeafType, bool)> = HashMap::new();

    let fail = |code: FailureCode, message: String, directive: &MergeDirective| {
        ValidationFailure::new(NAME, code, message)
            .on_entity(entity.qualified_name())
            .at(directive.source_map.as_ref())
    };

    for Located { property_name, directive } in directives {
        let source_text = directive.source_path.join(".");
        let target_text = directive.target_path.join(".");

        if directive.source_path.first() != Some(property_name) {
            let message = format!(
                "Merge directive on {} '{}' property '{}' must start its source path with the property name, found '{}'.",
                entity.kind, entity.name, property_name, source_text
            );
            failures.push(fail(FailureCode::MergeSourceStart, message, directive));
            continue;
        }

        let source = match walk_path(context, id, &directive.source_path) {
            Ok(leaf) => leaf,
            Err(i) => {
                let message = format!(
                    "Merge directive source path '{}' on {} '{}' could not be resolved at segment '{}'.",
                    source_text,
                    entity.kind,
                    entity.name,
                    segment_at(&directive.source_path, i)
                );
                failures.push(fail(FailureCode::SourcePathNotFound, message, directive));
                continue;
            }
        };

        let target = match walk_path(context, id, &directive.target_path) {
            Ok(leaf) => leaf,
            Err(i) => {
                let message = format!(
                    "Merge directive target path '{}' on {} '{}' could not be resolved at segment '{}'.",
                    target_text,
                    entity.kind,
                    entity.name,
                    segment_at(&directive.target_path, i)
                );
                failures.push(fail(FailureCode::TargetPathNotFound, message, directive));
                continue;
            }
        };

        // Unresolved references were already reported by the resolver
        let (Some(source_type), Some(target_type)) = (source.leaf_type, target.leaf_type) else {
            continue;
        };

        if source_type != target_type || source.is_collection != target.is_collection {
            let message = format!(
                "Merge directive on {} '{}' merges '{}' with '{}', which differ in type or cardinality.",
                entity.kind, entity.name, source_text, target_text
            );
            failures.push(fail(FailureCode::MergePathsMismatch, message, directive));
            continue;
        }

        let source_key = class_key(entity, &directive.source_path);
        let target_key = class_key(entity, &directive.target_path);
        set.union(&source_key, &target_key);
        members
            .entry(source_key)
            .or_insert_with(|| (directive.source_path.clone(), source_type, source.is_collection));
        members
            .entry(target_key)
            .or_insert_with(|| (directive.target_path.clone(), target_type, target.is_collection));
    }

    let mut classes = Vec::new();
    for keys in set.classes() {
        let paths: Vec<&(PropertyPath, LeafType, bool)> =
            keys.iter().filter_map(|k| members.get(k)).collect();
        let Some(&(_, leaf_type, is_collection)) = paths.first().copied() else {
            continue;
        };
        let Some(representative) = paths
            .iter()
            .map(|(path, _, _)| path)
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.join(".").cmp(&b.join("."))))
            .cloned()
        else {
            continue;
        };

        classes.push(MergeClass {
            members: paths.iter().map(|(path, _, _)| path.clone()).collect(),
            representative,
            leaf_type,
            is_collection,
        });
    }

    (MergeClasses { classes }, failures)
}

fn segment_at(path: &[String], index: usize) -> &str {
    path.get(index)
        .or_else(|| path.last())
        .map(String::as_str)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;
    use crate::link::{ReferenceResolver, SubclassLinker};
    use crate::version::DataStandardVersion;

    fn course_offering(source: &str, target: &str) -> ModelBuilder {
        ModelBuilder::new()
            .namespace("EdFi")
            .domain_entity("School")
            .integer_identity("SchoolId")
            .domain_entity("Session")
            .string_identity("SessionName")
            .domain_entity_identity("School", "")
            .domain_entity("CourseOffering")
            .string_identity("LocalCourseCode")
            .domain_entity_identity("Session", "")
            .merge(source, target)
            .domain_entity_identity("School", "")
    }

    fn resolved(builder: ModelBuilder) -> LinkContext {
        let repository = builder.build().unwrap();
        let mut ctx = LinkContext::new(repository, DataStandardVersion::parse("5.0.0").unwrap());
        ReferenceResolver.run(&mut ctx).unwrap();
        SubclassLinker.run(&mut ctx).unwrap();
        MergeDirectiveResolver.run(&mut ctx).unwrap();
        ctx
    }

    fn path(text: &str) -> PropertyPath {
        text.split('.').map(str::to_string).collect()
    }

    #[test]
    fn test_merge_builds_class_with_shorter_representative() {
        let ctx = resolved(course_offering("Session.School", "School"));
        assert!(ctx.diagnostics().is_empty(), "{}", ctx.diagnostics());

        let offering = ctx.find_resource("CourseOffering").unwrap();
        let classes = ctx.merge_classes(offering).unwrap();
        assert_eq!(classes.len(), 1);

        let class = &classes.classes[0];
        assert_eq!(class.representative, path("School"));
        assert_eq!(class.members, vec![path("Session.School"), path("School")]);
        assert_eq!(class.merged_away().collect::<Vec<_>>(), vec![&path("Session.School")]);
    }

    #[test]
    fn test_covering_matches_prefix() {
        let ctx = resolved(course_offering("Session.School", "School"));
        let offering = ctx.find_resource("CourseOffering").unwrap();
        let classes = ctx.merge_classes(offering).unwrap();

        let (class, member) = classes.covering(&path("Session.School.SchoolId")).unwrap();
        assert_eq!(member, &path("Session.School"));
        assert_eq!(class.representative, path("School"));
        assert!(classes.covering(&path("School.SchoolId")).is_none());
        assert!(classes.covering(&path("Session.SessionName")).is_none());
    }

    #[test]
    fn test_source_must_start_with_property_name() {
        let ctx = resolved(course_offering("School", "Session.School"));
        let failure = ctx.diagnostics().all().first().unwrap();
        assert_eq!(failure.code, FailureCode::MergeSourceStart);
    }

    #[test]
    fn test_source_path_not_found_names_segment() {
        let ctx = resolved(course_offering("Session.Campus", "School"));
        let failure = ctx.diagnostics().all().first().unwrap();
        assert_eq!(failure.code, FailureCode::SourcePathNotFound);
        assert!(failure.message.ends_with("at segment 'Campus'."));
    }

    #[test]
    fn test_target_path_not_found_names_segment() {
        let ctx = resolved(course_offering("Session.School", "Campus"));
        let failure = ctx.diagnostics().all().first().unwrap();
        assert_eq!(failure.code, FailureCode::TargetPathNotFound);
        assert!(failure.message.ends_with("at segment 'Campus'."));
    }

    #[test]
    fn test_mismatched_leaves_rejected() {
        let ctx = resolved(course_offering("Session.SessionName", "School"));
        let failure = ctx.diagnostics().all().first().unwrap();
        assert_eq!(failure.code, FailureCode::MergePathsMismatch);

        let offering = ctx.find_resource("CourseOffering").unwrap();
        assert!(ctx.merge_classes(offering).is_none());
    }

    #[test]
    fn test_non_identity_segment_not_walked() {
        let ctx = resolved(
            ModelBuilder::new()
                .namespace("EdFi")
                .domain_entity("School")
                .integer_identity("SchoolId")
                .string_property("WebSite")
                .domain_entity("Section")
                .string_identity("SectionIdentifier")
                .domain_entity_identity("School", "")
                .merge("School.WebSite", "SectionIdentifier"),
        );
        let failure = ctx.diagnostics().all().first().unwrap();
        assert_eq!(failure.code, FailureCode::SourcePathNotFound);
        assert!(failure.message.ends_with("at segment 'WebSite'."));
    }

    #[test]
    fn test_three_way_merge_is_one_class() {
        let ctx = resolved(
            ModelBuilder::new()
                .namespace("EdFi")
                .domain_entity("School")
                .integer_identity("SchoolId")
                .domain_entity("Session")
                .string_identity("SessionName")
                .domain_entity_identity("School", "")
                .domain_entity("Calendar")
                .string_identity("CalendarCode")
                .domain_entity_identity("School", "")
                .domain_entity("Attendance")
                .domain_entity_identity("Session", "")
                .merge("Session.School", "School")
                .domain_entity_identity("Calendar", "")
                .merge("Calendar.School", "Session.School")
                .domain_entity_identity("School", ""),
        );
        assert!(ctx.diagnostics().is_empty(), "{}", ctx.diagnostics());

        let attendance = ctx.find_resource("Attendance").unwrap();
        let classes = ctx.merge_classes(attendance).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes.classes[0].members.len(), 3);
        assert_eq!(classes.classes[0].representative, path("School"));
    }
}
