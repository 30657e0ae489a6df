//! JSON path projector
//!
//! Depth-first walk over composed properties:
//! - scalars project as `$.<name>`, collections as `$.<plural>[*].<name>`
//! - descriptors append `Descriptor`
//! - entity references open a `<name>Reference` object holding the flattened
//!   identity of the target; nested identity references add their role name
//!   as a prefix instead of a segment
//! - commons open an object, inline commons and choices add no segment
//! - extension overlays project under `$._ext.<namespace>`

use crate::context::{AspectData, LinkContext};
use crate::error::{LinkError, Result};
use crate::model::{EntityId, Property, PropertyType};
use crate::naming::{pluralize, prefix_chain, uncapitalize};
use crate::pipeline::{LinkedField, Pass};

use super::{EqualityConstraint, JsonPathEntry, JsonPathProjection};

const NAME: &str = "JsonPathProjector";

/// Pass storing a [`JsonPathProjection`] for every resource entity
#[derive(Debug, Clone, Copy)]
pub struct JsonPathProjector {
    pub include_extensions: bool,
}

impl Default for JsonPathProjector {
    fn default() -> Self {
        Self {
            include_extensions: true,
        }
    }
}

impl Pass for JsonPathProjector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reads(&self) -> &'static [LinkedField] {
        &[
            LinkedField::ResolvedTargets,
            LinkedField::Compositions,
            LinkedField::ExtensionOverlays,
            LinkedField::EquivalenceClasses,
        ]
    }

    fn writes(&self) -> &'static [LinkedField] {
        &[LinkedField::JsonPaths]
    }

    fn run(&self, context: &mut LinkContext) -> Result<()> {
        let mut projected = 0usize;

        for id in context.repository.entities_in_order()? {
            let is_resource = context
                .entity(id)
                .map(|e| e.kind.is_top_level_resource())
                .unwrap_or(false);
            if !is_resource {
                continue;
            }

            let projection = project_entity(context, id, self.include_extensions)?;
            context.api_schema.insert(id, AspectData::JsonPaths(projection));
            projected += 1;
        }

        tracing::info!(entities = projected, "projected json paths");
        Ok(())
    }
}

/// Project one entity. Pure: the same linked model always yields the same lists.
pub fn project_entity(context: &LinkContext, id: EntityId, include_extensions: bool) -> Result<JsonPathProjection> {
    let mut walker = Walker {
        context,
        expanding: Vec::new(),
        entries: Vec::new(),
    };

    walker.walk(id, &Frame::root("$".to_string()), false)?;
    let core_len = walker.entries.len();

    if include_extensions {
        for &overlay in context.extension_overlays(id) {
            let Some(extension) = context.entity(overlay) else {
                continue;
            };
            let prefix = format!("$._ext.{}", uncapitalize(&extension.namespace));
            walker.walk(overlay, &Frame::root(prefix), false)?;
        }
    }

    let all_paths = walker.entries;
    let classes = context.merge_classes(id);

    let mut document_paths = Vec::new();
    let mut equality_constraints = Vec::new();

    for (i, entry) in all_paths.iter().enumerate() {
        let covering = if i < core_len {
            classes.and_then(|c| c.covering(&entry.property_path))
        } else {
            None
        };

        let Some((class, member)) = covering else {
            document_paths.push(entry.clone());
            continue;
        };

        let mut target_path = class.representative.clone();
        target_path.extend_from_slice(&entry.property_path[member.len()..]);
        if let Some(target) = all_paths[..core_len].iter().find(|e| e.property_path == target_path) {
            equality_constraints.push(EqualityConstraint {
                source_json_path: entry.json_path.clone(),
                target_json_path: target.json_path.clone(),
            });
        }
    }

    let identity_paths: Vec<JsonPathEntry> = document_paths.iter().filter(|e| e.is_identity).cloned().collect();
    let identity_fullname = identity_paths
        .iter()
        .map(|e| e.flattened_name.as_str())
        .collect::<Vec<_>>()
        .join("_");

    Ok(JsonPathProjection {
        all_paths,
        document_paths,
        identity_paths,
        identity_fullname,
        equality_constraints,
    })
}

// =============================================================================
// Walker
// =============================================================================

/// Position of the walk
#[derive(Debug, Clone, Default)]
struct Frame {
    /// JSON path of the enclosing object
    json_prefix: String,
    /// Role names prefixed onto member names inside the enclosing object
    json_name_prefixes: Vec<String>,
    /// Every role name crossed so far
    name_prefixes: Vec<String>,
    property_path: Vec<String>,
    reference_chain: Vec<String>,
    reference_depth: usize,
    meta_ed_name: String,
    is_optional: bool,
    is_identity: bool,
    in_reference: bool,
}

impl Frame {
    fn root(json_prefix: String) -> Self {
        Self {
            json_prefix,
            ..Self::default()
        }
    }

    fn is_top_level(&self) -> bool {
        self.property_path.is_empty()
    }

    /// Frame for a property's own value or members
    fn descend(&self, property: &Property) -> Self {
        let full_name = property.full_name();
        let mut next = self.clone();
        if self.is_top_level() {
            next.meta_ed_name = full_name.clone();
            next.is_identity = property.is_identity;
        }
        next.property_path.push(full_name);
        next.is_optional |= property.is_optional();
        next
    }

    /// Member name inside the enclosing object, uncapitalized
    fn member_name(&self, full_name: &str) -> String {
        uncapitalize(&prefix_chain(&self.json_name_prefixes, full_name))
    }

    /// Plural member name for a collection
    fn collection_name(&self, full_name: &str) -> String {
        uncapitalize(&pluralize(&prefix_chain(&self.json_name_prefixes, full_name)))
    }
}

struct Walker<'a> {
    context: &'a LinkContext,
    /// Entities whose members are being expanded
    expanding: Vec<EntityId>,
    entries: Vec<JsonPathEntry>,
}

impl<'a> Walker<'a> {
    fn properties(&self, owner: EntityId) -> Vec<&'a Property> {
        let context = self.context;
        context
            .composition(owner)
            .map(|composition| {
                composition
                    .effective()
                    .filter_map(|c| context.repository.property(c.property))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn walk(&mut self, owner: EntityId, frame: &Frame, identity_only: bool) -> Result<()> {
        for property in self.properties(owner) {
            if identity_only && !property.is_identity {
                continue;
            }
            self.project(property, frame)?;
        }
        Ok(())
    }

    /// Walk the members of a referenced entity or common
    fn expand(&mut self, owner: EntityId, frame: &Frame, identity_only: bool) -> Result<()> {
        if self.expanding.contains(&owner) {
            return Err(LinkError::UnexpectedCycle {
                path: frame.json_prefix.clone(),
            });
        }
        self.expanding.push(owner);
        let result = self.walk(owner, frame, identity_only);
        self.expanding.pop();
        result
    }

    fn project(&mut self, property: &Property, frame: &Frame) -> Result<()> {
        match property.property_type {
            PropertyType::DomainEntity | PropertyType::Association => self.reference(property, frame),
            PropertyType::Common => self.common(property, frame),
            PropertyType::InlineCommon | PropertyType::Choice => self.inline(property, frame),
            PropertyType::Descriptor => {
                self.terminal(property, frame, "Descriptor");
                Ok(())
            }
            _ => {
                self.terminal(property, frame, "");
                Ok(())
            }
        }
    }

    fn terminal(&mut self, property: &Property, frame: &Frame, suffix: &str) {
        let full_name = property.full_name();
        let member = format!("{}{}", frame.member_name(&full_name), suffix);
        let json_path = if property.is_collection && !frame.in_reference {
            format!("{}.{}[*].{}", frame.json_prefix, frame.collection_name(&full_name), member)
        } else {
            format!("{}.{}", frame.json_prefix, member)
        };

        let next = frame.descend(property);
        self.entries.push(JsonPathEntry {
            json_path,
            meta_ed_name: next.meta_ed_name,
            is_optional: next.is_optional,
            reference_depth: next.reference_depth,
            property_path: next.property_path,
            flattened_name: prefix_chain(&frame.name_prefixes, &full_name),
            reference_chain: next.reference_chain,
            is_identity: next.is_identity,
        });
    }

    fn reference(&mut self, property: &Property, frame: &Frame) -> Result<()> {
        // Unresolved references were already reported
        let Some(target) = property.resolved_target() else {
            return Ok(());
        };
        let Some(target_entity) = self.context.entity(target) else {
            return Ok(());
        };

        let full_name = property.full_name();
        let mut next = frame.descend(property);

        if frame.in_reference {
            next.json_name_prefixes.extend(property.role_name.iter().cloned());
        } else {
            next.json_prefix = if property.is_collection {
                format!(
                    "{}.{}[*].{}Reference",
                    frame.json_prefix,
                    frame.collection_name(&full_name),
                    frame.member_name(&full_name)
                )
            } else {
                format!("{}.{}Reference", frame.json_prefix, frame.member_name(&full_name))
            };
            next.json_name_prefixes.clear();
        }

        next.name_prefixes.extend(property.role_name.iter().cloned());
        next.reference_chain.push(target_entity.name.clone());
        next.reference_depth += 1;
        next.in_reference = true;

        self.expand(target, &next, true)
    }

    fn common(&mut self, property: &Property, frame: &Frame) -> Result<()> {
        let Some(target) = property.resolved_target() else {
            return Ok(());
        };

        // Inside a reference a common flattens like an inline common
        if frame.in_reference {
            return self.inline(property, frame);
        }

        let full_name = property.full_name();
        let mut next = frame.descend(property);
        next.json_prefix = if property.is_collection {
            format!("{}.{}[*]", frame.json_prefix, frame.collection_name(&full_name))
        } else {
            format!("{}.{}", frame.json_prefix, frame.member_name(&full_name))
        };
        next.json_name_prefixes.clear();
        next.name_prefixes.extend(property.role_name.iter().cloned());

        self.expand(target, &next, false)
    }

    fn inline(&mut self, property: &Property, frame: &Frame) -> Result<()> {
        let Some(target) = property.resolved_target() else {
            return Ok(());
        };

        let mut next = frame.descend(property);
        if let Some(role) = property.role_name.as_ref().filter(|r| **r != property.name) {
            next.json_name_prefixes.push(role.clone());
            next.name_prefixes.push(role.clone());
        }

        self.expand(target, &next, false)
    }
}
