//! Tool configuration from scriptor.toml
//!
//! Holds the export endpoints, the object storage bucket used to build
//! download links from bare storage keys, where the project record is kept
//! and an optional writing prompt table. Every field has a default, so a
//! missing file or a partial file is fine. Environment variables override
//! whatever the file says.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Base URL of the hosted export API
pub const DEFAULT_API_BASE: &str = "https://8fcufgvt4m.execute-api.ca-central-1.amazonaws.com";

/// Default bucket holding exported files
pub const DEFAULT_BUCKET: &str = "crafted-scriptor-exports";

/// Default bucket region
pub const DEFAULT_REGION: &str = "ca-central-1";

/// Default export request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default directory for the project record
pub const DEFAULT_STORE_DIR: &str = ".scriptor";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "scriptor.toml";

/// Top-level configuration from scriptor.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptorConfig {
    /// Remote export endpoints
    pub export: ExportConfig,

    /// Object storage holding exported files
    pub storage: StorageConfig,

    /// Local project persistence
    pub project: ProjectConfig,

    /// Writing prompts
    pub inspiration: InspirationConfig,
}

/// Remote export endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Endpoint rendering HTML to PDF
    pub pdf_url: String,

    /// Endpoint converting HTML to DOCX
    pub docx_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pdf_url: format!("{}/export/pdf", DEFAULT_API_BASE),
            docx_url: format!("{}/export/docx", DEFAULT_API_BASE),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Object storage location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket name
    pub bucket: String,

    /// Bucket region
    pub region: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl StorageConfig {
    /// Public URL prefix for keys in this bucket (ends with `/`)
    pub fn bucket_url(&self) -> String {
        format!("https://{}.s3.{}.amazonaws.com/", self.bucket, self.region)
    }
}

/// Local project persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory holding the project record
    pub store_dir: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
        }
    }
}

/// Where writing prompts come from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspirationConfig {
    /// TOML prompt table; the built-in prompts are used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts_file: Option<PathBuf>,
}

impl ScriptorConfig {
    /// Load configuration from a scriptor.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ScriptorConfig)` - Successfully loaded configuration
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let config: ScriptorConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    ///
    /// Environment overrides are applied on top in both cases.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            log::info!("Loading configuration from {}", path.display());
            Self::load(path)?
        } else {
            log::debug!("No configuration at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Save configuration to a scriptor.toml file
    ///
    /// # Parameters
    /// * `path` - Path where the file will be written
    ///
    /// # Returns
    /// * `Ok(())` - Successfully saved configuration
    /// * `Err(ConfigError)` - Error serializing or writing the file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Apply `SCRIPTOR_*` overrides
    ///
    /// # Parameters
    /// * `lookup` - Resolves a variable name to its value, if set
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = non_empty("SCRIPTOR_PDF_URL") {
            self.export.pdf_url = url;
        }
        if let Some(url) = non_empty("SCRIPTOR_DOCX_URL") {
            self.export.docx_url = url;
        }
        if let Some(bucket) = non_empty("SCRIPTOR_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Some(region) = non_empty("SCRIPTOR_REGION") {
            self.storage.region = region;
        }
        if let Some(dir) = non_empty("SCRIPTOR_STORE_DIR") {
            self.project.store_dir = PathBuf::from(dir);
        }
        if let Some(file) = non_empty("SCRIPTOR_PROMPTS_FILE") {
            self.inspiration.prompts_file = Some(PathBuf::from(file));
        }
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
