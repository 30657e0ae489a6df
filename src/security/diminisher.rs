//! Hardcoded securable element lookup
//!
//! Per target: find the entity, keep the document paths that pass through
//! the expected reference chain, then match the resource and the terminal
//! property. Any miss is fatal. Nothing is written unless every target of
//! the diminisher resolved.

use semver::VersionReq;

use super::SecurableElement;
use crate::context::{AspectData, LinkContext};
use crate::error::{LinkError, Result};
use crate::model::EntityId;
use crate::pipeline::{LinkedField, Pass};
use crate::projection::JsonPathEntry;

/// The securable element expected on one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurableTarget {
    pub entity: &'static str,
    /// Entity names the path references, outermost first
    pub chain: &'static [&'static str],
    /// Full name of the top-level reference (role + entity)
    pub resource: &'static str,
    /// Flattened name of the terminal property
    pub property: &'static str,
}

#[derive(Debug, Clone)]
pub struct HardcodedSecurityDiminisher {
    name: &'static str,
    /// Data standard releases the targets were authored against
    versions: &'static str,
    targets: Vec<SecurableTarget>,
}

impl HardcodedSecurityDiminisher {
    pub fn new(name: &'static str, versions: &'static str, targets: Vec<SecurableTarget>) -> Self {
        Self {
            name,
            versions,
            targets,
        }
    }

    pub fn targets(&self) -> &[SecurableTarget] {
        &self.targets
    }

    fn fatal(&self, message: String) -> LinkError {
        LinkError::diminisher(self.name, message)
    }

    fn resolve(&self, context: &LinkContext, target: &SecurableTarget) -> Result<(EntityId, SecurableElement)> {
        let version = context.data_standard_version();

        let id = context.find_core_resource(target.entity).ok_or_else(|| {
            self.fatal(format!(
                "'{}' not found in EdFi Data Standard {}",
                target.entity, version
            ))
        })?;

        let document_paths = context
            .json_paths(id)
            .map(|p| p.document_paths.as_slice())
            .unwrap_or(&[]);

        let through_chain: Vec<&JsonPathEntry> = document_paths
            .iter()
            .filter(|e| passes_through(e, target.chain))
            .collect();
        if through_chain.is_empty() {
            return Err(self.fatal(format!(
                "No securable paths found for entity '{}'",
                target.entity
            )));
        }

        let of_resource: Vec<&JsonPathEntry> = through_chain
            .into_iter()
            .filter(|e| e.meta_ed_name == target.resource)
            .collect();
        if of_resource.is_empty() {
            return Err(self.fatal(format!(
                "EdFi Data Standard {} has removed {} resource from '{}'",
                version, target.resource, target.entity
            )));
        }

        let entry = of_resource
            .into_iter()
            .find(|e| e.flattened_name == target.property)
            .ok_or_else(|| {
                self.fatal(format!(
                    "EdFi Data Standard {} has removed {} property from '{}'",
                    version, target.property, target.entity
                ))
            })?;

        Ok((id, SecurableElement::new(&entry.json_path, &entry.meta_ed_name)))
    }
}

fn passes_through(entry: &JsonPathEntry, chain: &[&str]) -> bool {
    entry.reference_chain.len() >= chain.len()
        && entry.reference_chain.iter().zip(chain).all(|(a, b)| a == b)
}

impl Pass for HardcodedSecurityDiminisher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn reads(&self) -> &'static [LinkedField] {
        &[LinkedField::JsonPaths]
    }

    fn writes(&self) -> &'static [LinkedField] {
        &[LinkedField::SecurableElements]
    }

    fn run(&self, context: &mut LinkContext) -> Result<()> {
        let range = VersionReq::parse(self.versions)?;
        if !context.data_standard_version().satisfies(&range) {
            tracing::debug!(
                diminisher = self.name,
                version = %context.data_standard_version(),
                "data standard outside of diminisher range, skipping"
            );
            return Ok(());
        }

        let resolved = self
            .targets
            .iter()
            .map(|target| self.resolve(context, target))
            .collect::<Result<Vec<_>>>()?;

        for (id, element) in resolved {
            tracing::debug!(diminisher = self.name, path = %element.json_path, "securable element");
            let mut elements = context.securable_elements(id).map(<[_]>::to_vec).unwrap_or_default();
            elements.push(element);
            context.api_schema.insert(id, AspectData::SecurableElements(elements));
        }
        Ok(())
    }
}
