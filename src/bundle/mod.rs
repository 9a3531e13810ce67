//! Scan Bundles
//!
//! A scan bundle is one technician upload: intake metadata, scanner identity,
//! the raw output of several hardware tools keyed by source name, and the
//! per-source execution status.
//!
//! # Components
//!
//! - [`BundleValidator`] - size ceiling, schema and required-field checks
//! - [`Canonicalizer`] - deterministic serialization and content digest

pub mod canonical;
pub mod validator;

#[cfg(test)]
mod proptest;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::AssetId;

pub use canonical::Canonicalizer;
pub use validator::BundleValidator;

/// Name of the mandatory hardware-lister source
pub const LSHW_SOURCE: &str = "lshw";

/// Optional sources a scanner may include
pub const OPTIONAL_SOURCES: [&str; 6] = ["lsblk", "lspci", "lsusb", "upower", "edid", "smart"];

/// Who ran the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerInfo {
    pub hostname: String,
    pub user: String,
}

/// Intake metadata entered by the technician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intake {
    pub asset_id: AssetId,
    pub tech_name: Option<String>,
    pub client_name: Option<String>,
    pub cosmetic_condition: Option<String>,
    pub note: Option<String>,
}

/// Execution status of one source tool, recorded verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub rc: Option<i64>,
    pub stderr: Option<String>,
}

impl SourceStatus {
    /// A zero return code.
    pub fn succeeded(&self) -> bool {
        self.rc == Some(0)
    }
}

/// A validated scan bundle.
///
/// Typed accessors cover the fields the pipeline uses; `document` keeps the
/// complete parsed payload, unknown fields included, for hashing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanBundle {
    pub schema: String,
    pub generated_at: String,
    pub scanner: ScannerInfo,
    pub intake: Intake,
    pub sources: BTreeMap<String, Value>,
    pub status: BTreeMap<String, SourceStatus>,
    /// Human-readable RAM total from `meta.summary.ram`
    pub summary_ram: Option<String>,
    pub document: Value,
}

impl ScanBundle {
    /// The generation timestamp, if it is RFC 3339.
    pub fn generated_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.generated_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// The raw hardware-lister payload.
    pub fn lshw(&self) -> Option<&Value> {
        self.sources.get(LSHW_SOURCE)
    }

    pub fn asset_id(&self) -> &AssetId {
        &self.intake.asset_id
    }

    /// Sources whose tool exited non-zero.
    pub fn failed_sources(&self) -> Vec<&str> {
        self.status
            .iter()
            .filter(|(_, status)| status.rc.is_some() && !status.succeeded())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
