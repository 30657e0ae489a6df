//! Diagnostics
//!
//! Collects validation failures during linker passes. Failures are
//! recoverable: passes keep going and the run is rejected at the end if any
//! error was recorded.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::SourceMap;

// =============================================================================
// Failure Codes
// =============================================================================

/// Code for categorizing validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCode {
    // === References ===
    /// Property target not found in any visible namespace
    UnresolvedReference,
    /// Qualified target names a namespace the declaring namespace cannot see
    NamespaceNotVisible,

    // === Subclassing ===
    /// Subclass or extension base not found with the paired kind
    BaseNotFound,
    /// Subclass still unlinked at the end of the run
    BaseNotLinked,
    /// Own property repeats an inherited one
    RedeclaredProperty,
    /// Identity rename targets a non-identity or missing base property
    RenameNotIdentity,
    /// Same base identity property renamed twice
    DuplicateRename,
    /// Rename changes type or cardinality
    RenameTypeMismatch,
    /// Identity rename outside of a subclass
    RenameOutsideSubclass,

    // === Merges ===
    /// First source segment is not the declaring property
    MergeSourceStart,
    /// Source path does not resolve
    SourcePathNotFound,
    /// Target path does not resolve
    TargetPathNotFound,
    /// Source and target leaves differ in type or cardinality
    MergePathsMismatch,

    // === Simple types ===
    /// Duplicate implicit simple type removed from an extension
    DuplicateSimpleTypeRemoved,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedReference => "E001",
            Self::NamespaceNotVisible => "E002",
            Self::BaseNotFound => "E003",
            Self::BaseNotLinked => "E004",
            Self::RedeclaredProperty => "E005",
            Self::RenameNotIdentity => "E006",
            Self::DuplicateRename => "E007",
            Self::RenameTypeMismatch => "E008",
            Self::RenameOutsideSubclass => "E009",
            Self::MergeSourceStart => "E010",
            Self::SourcePathNotFound => "E011",
            Self::TargetPathNotFound => "E012",
            Self::MergePathsMismatch => "E013",
            Self::DuplicateSimpleTypeRemoved => "W001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::DuplicateSimpleTypeRemoved => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Validation Failure
// =============================================================================

/// A single recoverable problem found by a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    /// Pass or validator that reported it
    pub validator_name: String,
    pub code: FailureCode,
    pub category: Severity,
    pub message: String,
    /// `Namespace.Entity` the failure is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<SourceMap>,
}

impl ValidationFailure {
    pub fn new(validator_name: impl Into<String>, code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            validator_name: validator_name.into(),
            code,
            category: code.severity(),
            message: message.into(),
            entity: None,
            source_map: None,
        }
    }

    pub fn on_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn at(mut self, source_map: Option<&SourceMap>) -> Self {
        self.source_map = source_map.cloned();
        self
    }

    pub fn severity(&self) -> Severity {
        self.category
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.code, self.category, self.validator_name, self.message
        )?;
        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(source) = &self.source_map {
            write!(f, " at {}:{} '{}'", source.line, source.column, source.token_text)?;
        }
        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Ordered list of failures from every pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<ValidationFailure>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: ValidationFailure) {
        tracing::debug!(code = %item.code, "{}", item.message);
        self.items.push(item);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Failures carrying a given code
    pub fn with_code(&self, code: FailureCode) -> impl Iterator<Item = &ValidationFailure> {
        self.items.iter().filter(move |i| i.code == code)
    }

    /// Whether a failure was already recorded for an entity
    pub fn mentions_entity(&self, entity: &str) -> bool {
        self.items.iter().any(|i| i.entity.as_deref() == Some(entity))
    }

    pub fn all(&self) -> &[ValidationFailure] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = ValidationFailure;
    type IntoIter = std::vec::IntoIter<ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a ValidationFailure;
    type IntoIter = std::slice::Iter<'a, ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_severity() {
        assert_eq!(FailureCode::UnresolvedReference.severity(), Severity::Error);
        assert_eq!(FailureCode::DuplicateSimpleTypeRemoved.severity(), Severity::Warning);
    }

    #[test]
    fn test_diagnostics_collection() {
        let mut diags = Diagnostics::new();
        diags.push(
            ValidationFailure::new("ReferenceResolver", FailureCode::UnresolvedReference, "not found")
                .on_entity("EdFi.Student"),
        );
        diags.push(ValidationFailure::new(
            "DuplicateSimpleTypeDiminisher",
            FailureCode::DuplicateSimpleTypeRemoved,
            "removed",
        ));

        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert!(diags.has_errors());
        assert!(diags.mentions_entity("EdFi.Student"));
        assert_eq!(diags.with_code(FailureCode::UnresolvedReference).count(), 1);
    }

    #[test]
    fn test_display_includes_source() {
        let failure = ValidationFailure::new("SubclassLinker", FailureCode::BaseNotFound, "missing")
            .at(Some(&SourceMap::new(3, 7, "Widget")));
        let text = failure.to_string();
        assert!(text.starts_with("[E003] error SubclassLinker: missing"));
        assert!(text.contains("at 3:7 'Widget'"));
    }
}
