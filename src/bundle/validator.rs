//! Bundle Validator
//!
//! Enforces the payload ceiling, the schema identifier and the presence of
//! required fields, then checks the intake asset against the upload target.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. raw size against `max_bundle_bytes` (before any parsing)
//! 2. JSON object
//! 3. `schema`
//! 4. `generated_at`, `scanner.hostname`, `scanner.user`, `intake.asset_id`,
//!    `sources.lshw`, `meta.status`
//! 5. `intake.asset_id` equals the expected asset

use std::collections::BTreeMap;

use serde_json::Value;

use super::{Intake, ScanBundle, ScannerInfo, SourceStatus, LSHW_SOURCE};
use crate::config::{PipelineConfig, DEFAULT_MAX_BUNDLE_BYTES, DEFAULT_SCHEMA};
use crate::domain::AssetId;
use crate::error::{Error, Result};

/// Validates raw bundles into [`ScanBundle`]s. Pure; no side effects.
#[derive(Debug, Clone)]
pub struct BundleValidator {
    supported_schema: String,
    max_bundle_bytes: usize,
}

impl Default for BundleValidator {
    fn default() -> Self {
        Self {
            supported_schema: DEFAULT_SCHEMA.to_string(),
            max_bundle_bytes: DEFAULT_MAX_BUNDLE_BYTES,
        }
    }
}

impl BundleValidator {
    pub fn new(supported_schema: impl Into<String>, max_bundle_bytes: usize) -> Self {
        Self {
            supported_schema: supported_schema.into(),
            max_bundle_bytes,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.supported_schema.clone(), config.max_bundle_bytes)
    }

    pub fn max_bundle_bytes(&self) -> usize {
        self.max_bundle_bytes
    }

    /// Validate an uploaded payload.
    pub fn validate_bytes(&self, raw: &[u8], expected: &AssetId) -> Result<ScanBundle> {
        if raw.len() > self.max_bundle_bytes {
            return Err(Error::PayloadTooLarge {
                size: raw.len(),
                limit: self.max_bundle_bytes,
            });
        }

        let document: Value = serde_json::from_slice(raw)
            .map_err(|e| Error::MalformedBundle(format!("invalid JSON: {}", e)))?;

        self.validate(document, expected)
    }

    /// Validate a payload against the asset it names itself, for offline
    /// tooling that has no upload target. Same checks and order as
    /// [`validate_bytes`](Self::validate_bytes).
    pub fn validate_standalone(&self, raw: &[u8]) -> Result<ScanBundle> {
        if raw.len() > self.max_bundle_bytes {
            return Err(Error::PayloadTooLarge {
                size: raw.len(),
                limit: self.max_bundle_bytes,
            });
        }

        let document: Value = serde_json::from_slice(raw)
            .map_err(|e| Error::MalformedBundle(format!("invalid JSON: {}", e)))?;
        // A missing id is reported by `validate` as `MissingField`
        let claimed = AssetId::new(
            document
                .pointer("/intake/asset_id")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        );

        self.validate(document, &claimed)
    }

    /// Validate an already-parsed document. The size ceiling is not applied.
    pub fn validate(&self, document: Value, expected: &AssetId) -> Result<ScanBundle> {
        if !document.is_object() {
            return Err(Error::MalformedBundle("expected a JSON object".into()));
        }

        let schema = self.check_schema(&document)?;
        let generated_at = required_str(&document, "/generated_at", "generated_at")?;
        let hostname = required_str(&document, "/scanner/hostname", "scanner.hostname")?;
        let user = required_str(&document, "/scanner/user", "scanner.user")?;
        let asset_id = required_str(&document, "/intake/asset_id", "intake.asset_id")?;

        let sources = match document.get("sources") {
            Some(Value::Object(map)) if map.get(LSHW_SOURCE).is_some_and(|v| !v.is_null()) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
            _ => return Err(Error::MissingField(format!("sources.{}", LSHW_SOURCE))),
        };

        let status = match document.pointer("/meta/status") {
            None | Some(Value::Null) => return Err(Error::MissingField("meta.status".into())),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(name, entry)| (name.clone(), source_status(entry)))
                .collect::<BTreeMap<_, _>>(),
            Some(_) => {
                return Err(Error::MalformedBundle(
                    "meta.status must be an object".into(),
                ))
            }
        };

        if asset_id != expected.as_str() {
            return Err(Error::AssetMismatch {
                expected: expected.to_string(),
                found: asset_id,
            });
        }

        let summary_ram = match document.pointer("/meta/summary/ram") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(Error::MalformedBundle(
                    "meta.summary.ram must be a string".into(),
                ))
            }
        };

        let intake = Intake {
            asset_id: AssetId::new(asset_id),
            tech_name: optional_str(&document, "/intake/tech_name"),
            client_name: optional_str(&document, "/intake/client_name"),
            cosmetic_condition: optional_str(&document, "/intake/cosmetic_condition"),
            note: optional_str(&document, "/intake/note"),
        };

        Ok(ScanBundle {
            schema,
            generated_at,
            scanner: ScannerInfo { hostname, user },
            intake,
            sources,
            status,
            summary_ram,
            document,
        })
    }

    fn check_schema(&self, document: &Value) -> Result<String> {
        match document.get("schema") {
            Some(Value::String(s)) if *s == self.supported_schema => Ok(s.clone()),
            Some(Value::String(s)) => Err(Error::SchemaMismatch {
                expected: self.supported_schema.clone(),
                found: Some(s.clone()),
            }),
            None | Some(Value::Null) => Err(Error::SchemaMismatch {
                expected: self.supported_schema.clone(),
                found: None,
            }),
            Some(other) => Err(Error::SchemaMismatch {
                expected: self.supported_schema.clone(),
                found: Some(other.to_string()),
            }),
        }
    }
}

/// A non-blank string at `pointer`; absent, null or blank is `MissingField`.
fn required_str(document: &Value, pointer: &str, field: &str) -> Result<String> {
    match document.pointer(pointer) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            Err(Error::MissingField(field.to_string()))
        }
        Some(_) => Err(Error::MalformedBundle(format!("{} must be a string", field))),
    }
}

fn optional_str(document: &Value, pointer: &str) -> Option<String> {
    document
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn source_status(entry: &Value) -> SourceStatus {
    SourceStatus {
        rc: entry.get("rc").and_then(Value::as_i64),
        stderr: entry
            .get("stderr")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}
