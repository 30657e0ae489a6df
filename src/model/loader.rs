//! Model Loading
//!
//! Loads namespace documents from a directory of JSON files and builds the
//! unlinked repository. Each file holds one namespace document; a namespace
//! may be split across several files, in which case their entities are
//! concatenated in file order.
//!
//! ```json
//! {
//!   "name": "EdFi",
//!   "entities": [
//!     { "kind": "domainEntity", "name": "School",
//!       "properties": [ { "type": "integer", "name": "SchoolId", "isIdentity": true } ] }
//!   ]
//! }
//! ```

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{
    EntityKind, MergeDirective, ModelEntity, ModelRepository, Namespace, Property, PropertyType, SourceMap,
    TypeName,
};

/// Configuration for model loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Skip files matching these path prefixes
    pub skip_prefixes: Vec<String>,
    /// Only load files matching these path prefixes
    pub include_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: vec![
                "target/".to_string(),
                ".git/".to_string(),
                "node_modules/".to_string(),
            ],
            include_prefixes: Vec::new(),
        }
    }
}

/// A loaded, still unlinked model
#[derive(Debug)]
pub struct LoadedModel {
    pub repository: ModelRepository,
    /// SHA-256 over every loaded file, in load order
    pub bundle_hash: String,
    /// Loaded files, relative to the model directory
    pub files: Vec<PathBuf>,
}

// =============================================================================
// Documents
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceDocument {
    name: String,
    #[serde(default)]
    is_extension: bool,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    entities: Vec<EntityDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityDocument {
    kind: EntityKind,
    name: String,
    #[serde(default)]
    documentation: String,
    #[serde(default)]
    is_abstract: bool,
    #[serde(default)]
    is_implicit: bool,
    #[serde(default)]
    base: Option<TypeName>,
    #[serde(default)]
    properties: Vec<PropertyDocument>,
    #[serde(default)]
    queryable_fields: Vec<String>,
    #[serde(default)]
    source_map: Option<SourceMap>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyDocument {
    #[serde(rename = "type")]
    property_type: PropertyType,
    name: String,
    #[serde(default)]
    role_name: String,
    #[serde(default)]
    is_identity: bool,
    #[serde(default)]
    is_required: bool,
    #[serde(default)]
    is_collection: bool,
    #[serde(default)]
    identity_rename: Option<String>,
    /// Defaults to `name` for referential properties
    #[serde(default)]
    target: Option<TypeName>,
    #[serde(default)]
    merges: Vec<MergeDocument>,
    #[serde(default)]
    documentation: String,
    #[serde(default)]
    source_map: Option<SourceMap>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeDocument {
    /// Dotted path, e.g. `Session.School`
    source: String,
    target: String,
}

impl PropertyDocument {
    fn into_property(self, namespace: &str) -> Property {
        let mut property = Property::new(self.property_type, &self.name, namespace).with_role(self.role_name);
        if let Some(target) = self.target {
            property.target = Some(target);
        } else if self.property_type.is_referential() {
            property = property.targeting(TypeName::parse(&self.name));
        }
        if self.is_identity {
            property = property.identity();
        }
        if self.is_required {
            property = property.required();
        }
        if self.is_collection {
            property = property.collection();
        }
        if let Some(renamed) = self.identity_rename {
            property = property.renaming(renamed);
        }
        property.merge_directives = self
            .merges
            .iter()
            .map(|m| MergeDirective::new(&m.source, &m.target))
            .collect();
        property.documentation = self.documentation;
        property.source_map = self.source_map;
        property
    }
}

impl EntityDocument {
    fn into_entity(self, namespace: &str) -> ModelEntity {
        let mut entity = ModelEntity::new(self.kind, &self.name, namespace);
        entity.documentation = self.documentation;
        entity.is_abstract = self.is_abstract;
        entity.is_implicit = self.is_implicit;
        entity.base_name = self.base;
        entity.queryable_fields = self.queryable_fields;
        entity.source_map = self.source_map;
        entity.properties = self
            .properties
            .into_iter()
            .map(|p| p.into_property(namespace))
            .collect();
        entity
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load namespace documents from a filesystem directory
pub fn load_from_directory(model_dir: &Path, config: &LoadConfig) -> anyhow::Result<LoadedModel> {
    let mut hasher = Sha256::new();
    let mut files = Vec::new();
    let mut documents: Vec<NamespaceDocument> = Vec::new();

    for entry in WalkDir::new(model_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }

        let relative_path = path.strip_prefix(model_dir)?.to_path_buf();
        let relative_str = relative_path.to_string_lossy();

        // Apply include/skip filters
        if !config.include_prefixes.is_empty() && !config.include_prefixes.iter().any(|p| relative_str.starts_with(p)) {
            continue;
        }
        if config.skip_prefixes.iter().any(|p| relative_str.starts_with(p)) {
            continue;
        }

        let content = fs::read_to_string(path)?;
        hasher.update(content.as_bytes());

        let document: NamespaceDocument = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse namespace document {}: {}", path.display(), e))?;
        tracing::debug!(file = %relative_path.display(), namespace = %document.name, "loaded namespace document");

        match documents.iter_mut().find(|d| d.name == document.name) {
            Some(existing) => existing.entities.extend(document.entities),
            None => documents.push(document),
        }
        files.push(relative_path);
    }

    let mut repository = ModelRepository::new();
    for document in &documents {
        let namespace = if document.is_extension {
            Namespace::extension(&document.name, document.dependencies.clone())
        } else {
            Namespace::core(&document.name)
        };
        repository.add_namespace(namespace)?;
    }
    // Surface unknown dependencies and cycles at load time
    repository.dependency_order()?;

    for document in documents {
        let namespace = document.name;
        for entity in document.entities {
            repository.add_entity(entity.into_entity(&namespace))?;
        }
    }

    let bundle_hash = format!("{:x}", hasher.finalize());
    tracing::info!(
        files = files.len(),
        entities = repository.entity_count(),
        "loaded model"
    );

    Ok(LoadedModel {
        repository,
        bundle_hash,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORE: &str = r#"{
        "name": "EdFi",
        "entities": [
            { "kind": "domainEntity", "name": "School",
              "properties": [ { "type": "integer", "name": "SchoolId", "isIdentity": true } ] },
            { "kind": "domainEntity", "name": "Session",
              "properties": [
                { "type": "string", "name": "SessionName", "isIdentity": true },
                { "type": "domainEntity", "name": "School", "isIdentity": true,
                  "merges": [ { "source": "School", "target": "School" } ] }
              ] }
        ]
    }"#;

    const EXTENSION: &str = r#"{
        "name": "Sample",
        "isExtension": true,
        "dependencies": ["EdFi"],
        "entities": [
            { "kind": "domainEntityExtension", "name": "School", "base": "EdFi.School",
              "properties": [ { "type": "string", "name": "CampusCode", "roleName": "" } ] }
        ]
    }"#;

    fn write_model(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_load_namespaces_and_entities() {
        let dir = write_model(&[("core/edfi.json", CORE), ("extension/sample.json", EXTENSION)]);
        let loaded = load_from_directory(dir.path(), &LoadConfig::default()).unwrap();

        assert_eq!(loaded.files.len(), 2);
        assert_eq!(loaded.repository.entity_count(), 3);
        let sample = loaded.repository.namespace("Sample").unwrap();
        assert!(sample.is_extension);
        assert_eq!(sample.dependencies, vec!["EdFi"]);

        let session = loaded
            .repository
            .find_by_name(&[EntityKind::DomainEntity], "Session")
            .unwrap();
        let school_ref = &loaded.repository.entity(session).unwrap().properties[1];
        assert_eq!(school_ref.target, Some(TypeName::local("School")));
        assert!(school_ref.is_identity);
        assert_eq!(school_ref.merge_directives.len(), 1);
    }

    #[test]
    fn test_bundle_hash_is_stable() {
        let first = write_model(&[("edfi.json", CORE)]);
        let second = write_model(&[("edfi.json", CORE)]);
        let a = load_from_directory(first.path(), &LoadConfig::default()).unwrap();
        let b = load_from_directory(second.path(), &LoadConfig::default()).unwrap();
        assert_eq!(a.bundle_hash, b.bundle_hash);
        assert_eq!(a.bundle_hash.len(), 64);
    }

    #[test]
    fn test_skip_prefixes() {
        let dir = write_model(&[("edfi.json", CORE), ("target/stale.json", "not json")]);
        let loaded = load_from_directory(dir.path(), &LoadConfig::default()).unwrap();
        assert_eq!(loaded.files, vec![PathBuf::from("edfi.json")]);
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let dir = write_model(&[("sample.json", EXTENSION)]);
        let err = load_from_directory(dir.path(), &LoadConfig::default()).unwrap_err();
        assert!(err.to_string().contains("unknown namespace 'EdFi'"));
    }

    #[test]
    fn test_invalid_json_names_file() {
        let dir = write_model(&[("broken.json", "{ \"name\": ")]);
        let err = load_from_directory(dir.path(), &LoadConfig::default()).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
