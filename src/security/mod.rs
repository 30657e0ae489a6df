//! Hardcoded Security Overlays
//!
//! A few legacy resources carry education organization securable elements
//! that cannot be derived from the model alone. Each diminisher in
//! [`catalog`] names the exact path it expects and fails the run when a
//! data standard release no longer has it.

pub mod catalog;
pub mod diminisher;

use serde::{Deserialize, Serialize};

pub use diminisher::{HardcodedSecurityDiminisher, SecurableTarget};

/// A document path that authorization filters on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurableElement {
    pub json_path: String,
    pub meta_ed_name: String,
}

impl SecurableElement {
    pub fn new(json_path: impl Into<String>, meta_ed_name: impl Into<String>) -> Self {
        Self {
            json_path: json_path.into(),
            meta_ed_name: meta_ed_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let element = SecurableElement::new("$.reportedSchoolReference.schoolId", "ReportedSchool");
        let json = serde_json::to_string(&element).unwrap();
        assert_eq!(
            json,
            r#"{"jsonPath":"$.reportedSchoolReference.schoolId","metaEdName":"ReportedSchool"}"#
        );
    }
}
