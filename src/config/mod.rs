//! Pipeline Configuration
//!
//! Tunables for bundle validation and hardware extraction. Every field has a
//! default, so a YAML document only needs the keys it overrides.
//!
//! ```yaml
//! supported_schema: motherboard.scan_bundle.v1
//! max_bundle_bytes: 5242880
//! extractor:
//!   max_depth: 64
//!   extra_ephemeral_prefixes: ["zram"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bundle schema identifier accepted by default
pub const DEFAULT_SCHEMA: &str = "motherboard.scan_bundle.v1";

/// Default payload ceiling (5 MiB)
pub const DEFAULT_MAX_BUNDLE_BYTES: usize = 5 * 1024 * 1024;

/// Default limit on hardware tree nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

// =============================================================================
// Extractor Configuration
// =============================================================================

/// Configuration for the hardware extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Subtrees nested deeper than this are dropped with a warning
    pub max_depth: usize,

    /// Logical-name prefixes excluded from the drive list in addition to the
    /// built-in card reader, loopback and optical prefixes
    pub extra_ephemeral_prefixes: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            extra_ephemeral_prefixes: Vec::new(),
        }
    }
}

// =============================================================================
// Pipeline Configuration
// =============================================================================

/// Configuration for the ingest pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// The only schema identifier the validator accepts
    pub supported_schema: String,

    /// Raw payload ceiling in bytes, checked before parsing
    pub max_bundle_bytes: usize,

    /// Hardware extractor settings
    pub extractor: ExtractorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            supported_schema: DEFAULT_SCHEMA.to_string(),
            max_bundle_bytes: DEFAULT_MAX_BUNDLE_BYTES,
            extractor: ExtractorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document and validate the result.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Reject settings the pipeline cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.supported_schema.trim().is_empty() {
            return Err(Error::Config("supported_schema must not be empty".into()));
        }
        if self.max_bundle_bytes == 0 {
            return Err(Error::Config("max_bundle_bytes must be positive".into()));
        }
        if self.extractor.max_depth == 0 {
            return Err(Error::Config("extractor.max_depth must be positive".into()));
        }
        if self
            .extractor
            .extra_ephemeral_prefixes
            .iter()
            .any(|p| p.trim().is_empty())
        {
            return Err(Error::Config(
                "extractor.extra_ephemeral_prefixes must not contain blank entries".into(),
            ));
        }
        Ok(())
    }
}
