//! Configuration management for the linker
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (metaed-linker.toml)
//! - Environment variables (METAED_LINKER__*)
//!
//! ## Example config file (metaed-linker.toml):
//! ```toml
//! [linker]
//! data_standard_version = "5.0.0"
//! model_dir = "./model"
//! fail_on_warnings = false
//!
//! [projection]
//! include_extensions = true
//!
//! [security]
//! enabled = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::version::DataStandardVersion;

/// Main configuration for a linker run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkerConfig {
    #[serde(default)]
    pub linker: LinkerSection,

    #[serde(default)]
    pub projection: ProjectionConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Model input and run policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkerSection {
    /// Data standard release the model belongs to
    #[serde(default = "default_data_standard_version")]
    pub data_standard_version: String,

    /// Directory of JSON namespace documents
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Treat warnings as errors when checking
    #[serde(default)]
    pub fail_on_warnings: bool,
}

/// JSON path projection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Project extension overlays under `_ext`
    #[serde(default = "default_true")]
    pub include_extensions: bool,
}

/// Hardcoded security overlay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Run the hardcoded security diminishers
    #[serde(default = "default_true")]
    pub enabled: bool,
}

// Default value functions
fn default_data_standard_version() -> String {
    "5.0.0".to_string()
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("model")
}

fn default_true() -> bool {
    true
}

impl Default for LinkerSection {
    fn default() -> Self {
        Self {
            data_standard_version: default_data_standard_version(),
            model_dir: default_model_dir(),
            fail_on_warnings: false,
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            include_extensions: true,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl LinkerConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "metaed-linker.toml",
            ".metaed-linker.toml",
            "config/metaed-linker.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("org", "edfi", "metaed-linker") {
            let xdg_config = config_dir.config_dir().join("metaed-linker.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // METAED_LINKER__LINKER__DATA_STANDARD_VERSION=4.0
        builder = builder.add_source(
            Environment::with_prefix("METAED_LINKER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    pub fn data_standard_version(&self) -> Result<DataStandardVersion> {
        DataStandardVersion::parse(&self.linker.data_standard_version)
    }

    /// Model directory (resolves relative paths)
    pub fn model_dir(&self) -> PathBuf {
        if self.linker.model_dir.is_absolute() {
            self.linker.model_dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.linker.model_dir)
        }
    }
}
