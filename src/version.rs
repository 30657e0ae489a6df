//! Data standard versioning
//!
//! Data standards are published with short versions ("4.0", "8.0") and
//! pre-release tags ("3.3.0-a"). Both are normalized to semver for range
//! checks while the text as written is kept for messages.

use regex::Regex;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{LinkError, Result};

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(-[0-9A-Za-z.-]+)?$")
            .expect("data standard version pattern is valid")
    })
}

/// The data standard version a model was authored against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataStandardVersion {
    /// Version as written, without a leading 'v'
    raw: String,
    /// Normalized semantic version
    version: Version,
}

impl DataStandardVersion {
    /// Parse a version string, accepting "8.0", "v5.0.0" and "3.3.0-a".
    pub fn parse(version_str: &str) -> Result<Self> {
        let trimmed = version_str.trim();
        let raw = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let captures = version_pattern()
            .captures(raw)
            .ok_or_else(|| LinkError::InvalidVersion(version_str.to_string()))?;

        let part = |i: usize| captures.get(i).map(|m| m.as_str()).unwrap_or("0");
        let pre = captures.get(4).map(|m| m.as_str()).unwrap_or("");
        let normalized = format!("{}.{}.{}{}", part(1), part(2), part(3), pre);
        let version = Version::parse(&normalized)?;

        Ok(Self {
            raw: raw.to_string(),
            version,
        })
    }

    /// The version as written (e.g., "8.0")
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The normalized semantic version (e.g., 8.0.0)
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Check whether this version falls inside a range. Pre-release tags
    /// ("3.3.1-b") count as their release.
    pub fn satisfies(&self, range: &VersionReq) -> bool {
        range.matches(&self.release())
    }

    /// `major.minor.patch` without the pre-release tag
    pub fn release(&self) -> Version {
        Version::new(self.version.major, self.version.minor, self.version.patch)
    }
}

impl fmt::Display for DataStandardVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl TryFrom<String> for DataStandardVersion {
    type Error = LinkError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DataStandardVersion> for String {
    fn from(value: DataStandardVersion) -> Self {
        value.raw
    }
}

impl PartialEq for DataStandardVersion {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for DataStandardVersion {}

impl PartialOrd for DataStandardVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataStandardVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.version.cmp(&other.version)
    }
}
