//! Domain Ports (DDD Port/Adapter Pattern)
//!
//! This module defines the value objects of the intake domain and the
//! persistence abstractions (ports) the pipeline depends on. Infrastructure
//! adapters implement these traits to provide concrete storage.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    Ports (Traits)                    │    │
//! │  │   DigestLedger  │  DriveRepository  │  AuditSink     │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                  Adapters (Impls)                    │    │
//! │  │ InMemoryDigestLedger │ InMemoryDriveRepository │ ... │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::hardware::format_bytes;

use super::events::AuditEvent;

// =============================================================================
// Value Objects
// =============================================================================

/// Asset identifier (value object).
///
/// Compared by exact string equality; no case folding or trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// SHA-256 digest of a canonicalized scan bundle, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Length of the hex rendering.
    pub const HEX_LEN: usize = 64;

    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parse a hex digest, normalizing to lowercase.
    pub fn from_hex(hex_digest: &str) -> Result<Self> {
        let normalized = hex_digest.trim().to_ascii_lowercase();
        if normalized.len() != Self::HEX_LEN || hex::decode(&normalized).is_err() {
            return Err(Error::Internal(format!(
                "invalid content digest '{}'",
                hex_digest
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proof that a bundle was accepted for an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReceipt {
    pub scan_id: Uuid,
    pub asset_id: AssetId,
    pub digest: ContentDigest,
    pub recorded_at: DateTime<Utc>,
}

impl ScanReceipt {
    pub fn new(asset_id: AssetId, digest: ContentDigest) -> Self {
        Self {
            scan_id: Uuid::new_v4(),
            asset_id,
            digest,
            recorded_at: Utc::now(),
        }
    }
}

/// Result of the ledger's conditional insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerInsert {
    /// This caller recorded the digest first
    Inserted(ScanReceipt),
    /// The digest was already recorded; carries the original receipt
    AlreadyPresent(ScanReceipt),
}

// =============================================================================
// Drive Records
// =============================================================================

/// Lifecycle status of a physical drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveStatus {
    Present,
    Removed,
    Wiped,
    Shredded,
    ReturnedToClient,
}

impl DriveStatus {
    pub const ALL: [DriveStatus; 5] = [
        DriveStatus::Present,
        DriveStatus::Removed,
        DriveStatus::Wiped,
        DriveStatus::Shredded,
        DriveStatus::ReturnedToClient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriveStatus::Present => "present",
            DriveStatus::Removed => "removed",
            DriveStatus::Wiped => "wiped",
            DriveStatus::Shredded => "shredded",
            DriveStatus::ReturnedToClient => "returned_to_client",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            DriveStatus::Present => "Present",
            DriveStatus::Removed => "Removed",
            DriveStatus::Wiped => "Wiped",
            DriveStatus::Shredded => "Shredded",
            DriveStatus::ReturnedToClient => "Returned to Client",
        }
    }
}

impl std::fmt::Display for DriveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DriveStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DriveStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidDrive(format!("unknown drive status '{}'", s)))
    }
}

/// How a drive record first came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveProvenance {
    /// Created from a hardware scan
    Scan,
    /// Entered by an operator
    Manual,
}

impl std::fmt::Display for DriveProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriveProvenance::Scan => write!(f, "scan"),
            DriveProvenance::Manual => write!(f, "manual"),
        }
    }
}

/// Persistent record of one physical drive belonging to an asset.
///
/// Identity is `(asset_id, serial)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveRecord {
    /// Store-assigned id, increasing in creation order
    pub id: u64,
    pub asset_id: AssetId,
    pub serial: String,
    pub logical_path: Option<String>,
    pub capacity_bytes: Option<u64>,
    pub model: Option<String>,
    pub provenance: DriveProvenance,
    pub status: DriveStatus,
    pub status_note: String,
    pub status_by: Option<String>,
    pub status_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Last time a scan reported this serial
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl DriveRecord {
    /// Human-readable capacity (e.g. "256.0 GB").
    pub fn capacity_human(&self) -> Option<String> {
        self.capacity_bytes
            .filter(|bytes| *bytes > 0)
            .map(format_bytes)
    }

    /// Display tag for the serial.
    pub fn serial_tag(&self) -> Option<String> {
        if self.serial.is_empty() {
            None
        } else {
            Some(format!("(SN {})", self.serial))
        }
    }
}

impl DriveRecord {
    /// Record for an operator-entered drive; the store assigns `id`.
    pub fn manual(
        asset_id: &AssetId,
        drive: ManualDrive,
        actor: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            asset_id: asset_id.clone(),
            serial: drive.serial.trim().to_string(),
            logical_path: drive.logical_path,
            capacity_bytes: drive.capacity_bytes,
            model: drive.model,
            provenance: DriveProvenance::Manual,
            status: DriveStatus::Present,
            status_note: drive.note,
            status_by: Some(actor.into()),
            status_at: at,
            created_at: at,
            last_seen_at: None,
        }
    }
}

/// Drive details entered by an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualDrive {
    pub serial: String,
    pub logical_path: Option<String>,
    pub capacity_bytes: Option<u64>,
    pub model: Option<String>,
    #[serde(default)]
    pub note: String,
}

impl ManualDrive {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            ..Default::default()
        }
    }
}

/// Drive facts from a scan, keyed by a non-blank serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDrive {
    pub serial: String,
    pub logical_path: Option<String>,
    pub capacity_bytes: Option<u64>,
    pub model: Option<String>,
    pub seen_at: DateTime<Utc>,
}

/// Outcome of a scan upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created(DriveRecord),
    Refreshed(DriveRecord),
}

impl UpsertOutcome {
    pub fn record(&self) -> &DriveRecord {
        match self {
            UpsertOutcome::Created(record) | UpsertOutcome::Refreshed(record) => record,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }
}

/// Operator-driven lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: DriveStatus,
    pub note: String,
    pub actor: String,
    pub at: DateTime<Utc>,
}

// =============================================================================
// Digest Ledger Port
// =============================================================================

/// Port for the per-asset deduplication ledger.
///
/// Implementations must make `record_if_absent` a single atomic conditional
/// insert against a uniqueness constraint on `(asset, digest)`: of any number
/// of concurrent callers with the same pair, exactly one sees `Inserted`.
#[async_trait]
pub trait DigestLedger: Send + Sync {
    /// Record the digest unless it is already present.
    async fn record_if_absent(
        &self,
        asset_id: &AssetId,
        digest: &ContentDigest,
    ) -> Result<LedgerInsert>;

    /// Read-only lookup.
    async fn contains(&self, asset_id: &AssetId, digest: &ContentDigest) -> Result<bool>;

    /// Remove a receipt this pipeline inserted, only if `scan_id` still matches.
    async fn release(
        &self,
        asset_id: &AssetId,
        digest: &ContentDigest,
        scan_id: Uuid,
    ) -> Result<()>;
}

// =============================================================================
// Drive Repository Port
// =============================================================================

/// Port for drive record persistence.
#[async_trait]
pub trait DriveRepository: Send + Sync {
    /// Atomically create the `(asset, serial)` record or refresh its
    /// path, capacity, model and last-seen time. Lifecycle fields and
    /// provenance of an existing record are left untouched.
    async fn upsert_scanned(&self, asset_id: &AssetId, drive: ScannedDrive)
        -> Result<UpsertOutcome>;

    /// Insert an operator-entered record. Fails with `DriveAlreadyExists`
    /// when the identity is taken. The store assigns `id`.
    async fn insert_manual(&self, record: DriveRecord) -> Result<DriveRecord>;

    /// Get a drive by identity.
    async fn get(&self, asset_id: &AssetId, serial: &str) -> Result<Option<DriveRecord>>;

    /// All drives of an asset, in creation order.
    async fn list_for_asset(&self, asset_id: &AssetId) -> Result<Vec<DriveRecord>>;

    /// Every record with this serial across all assets, newest first.
    async fn find_by_serial(&self, serial: &str) -> Result<Vec<DriveRecord>>;

    /// Apply a lifecycle change. Returns the previous status and the updated
    /// record, or `None` when the identity does not exist.
    async fn update_status(
        &self,
        asset_id: &AssetId,
        serial: &str,
        update: StatusUpdate,
    ) -> Result<Option<(DriveStatus, DriveRecord)>>;
}

// =============================================================================
// Audit Sink Port
// =============================================================================

/// Port for the append-only audit log.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one event.
    async fn append(&self, event: AuditEvent) -> Result<()>;

    /// Append several events in order.
    async fn append_all(&self, events: Vec<AuditEvent>) -> Result<()> {
        for event in events {
            self.append(event).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<T: AuditSink + ?Sized> AuditSink for std::sync::Arc<T> {
    async fn append(&self, event: AuditEvent) -> Result<()> {
        (**self).append(event).await
    }

    async fn append_all(&self, events: Vec<AuditEvent>) -> Result<()> {
        (**self).append_all(events).await
    }
}

// =============================================================================
// Tests
// =============================================================================
