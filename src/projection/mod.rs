//! JSON Path Projection
//!
//! Projects each linked resource entity into the canonical JSON paths of its
//! API document. Consumers snapshot-compare these lists, so every list is in
//! declaration order and never depends on map iteration.

pub mod json_paths;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use json_paths::{project_entity, JsonPathProjector};

/// One terminal value reachable from a resource document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPathEntry {
    /// e.g. `$.schoolReference.schoolId`
    pub json_path: String,
    /// Full name of the top-level property the path starts at
    pub meta_ed_name: String,
    pub is_optional: bool,
    /// Number of references crossed to reach the value
    pub reference_depth: usize,
    /// Property full names from the resource down to the value
    pub property_path: Vec<String>,
    /// Ancestor role names prepended to the terminal full name
    pub flattened_name: String,
    /// Names of the entities referenced along the way
    pub reference_chain: Vec<String>,
    /// The top-level property is part of the identity
    pub is_identity: bool,
}

/// Two document locations that must hold the same value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqualityConstraint {
    pub source_json_path: String,
    pub target_json_path: String,
}

/// All projected paths of one entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPathProjection {
    /// Every terminal, merged-away duplicates included
    pub all_paths: Vec<JsonPathEntry>,
    /// Terminals the entity's document carries
    pub document_paths: Vec<JsonPathEntry>,
    /// Natural key, in identity declaration order
    pub identity_paths: Vec<JsonPathEntry>,
    pub identity_fullname: String,
    /// Merged-away paths and the representative paths they equal
    pub equality_constraints: Vec<EqualityConstraint>,
}

impl JsonPathProjection {
    pub fn all_json_paths(&self) -> Vec<&str> {
        self.all_paths.iter().map(|e| e.json_path.as_str()).collect()
    }

    pub fn document_json_paths(&self) -> Vec<&str> {
        self.document_paths.iter().map(|e| e.json_path.as_str()).collect()
    }

    pub fn identity_json_paths(&self) -> Vec<&str> {
        self.identity_paths.iter().map(|e| e.json_path.as_str()).collect()
    }

    /// SHA-256 over the ordered path lists, for snapshot comparison
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (label, entries) in [
            ("all", &self.all_paths),
            ("document", &self.document_paths),
            ("identity", &self.identity_paths),
        ] {
            hasher.update(label.as_bytes());
            for entry in entries {
                hasher.update(b"\n");
                hasher.update(entry.json_path.as_bytes());
            }
            hasher.update(b"\n\n");
        }
        hasher.update(self.identity_fullname.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
