//! Audit Events
//!
//! Immutable records of state-changing outcomes in the intake pipeline.
//! Read-only operations never produce an event.
//!
//! # Example
//!
//! ```ignore
//! let event = AuditEvent::drive_created(&asset, "tech-7", &record);
//! audit_sink.append(event).await?;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ports::{AssetId, ContentDigest, DriveProvenance, DriveRecord, DriveStatus, ScanReceipt};
use crate::error::Error;

/// Kind of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditEventKind {
    ScanAccepted,
    ScanDuplicate,
    ScanRejected,
    DriveCreated,
    DriveStatusChanged,
}

impl AuditEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventKind::ScanAccepted => "scan-accepted",
            AuditEventKind::ScanDuplicate => "scan-duplicate",
            AuditEventKind::ScanRejected => "scan-rejected",
            AuditEventKind::DriveCreated => "drive-created",
            AuditEventKind::DriveStatusChanged => "drive-status-changed",
        }
    }
}

impl std::fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured detail payload, one shape per event kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuditDetail {
    // =========================================================================
    // Scan Events
    // =========================================================================
    /// A new bundle was accepted and processed.
    ScanAccepted {
        scan_id: Uuid,
        digest: ContentDigest,
        drives_reported: usize,
        drives_created: usize,
        parse_warnings: usize,
    },

    /// A bundle identical to an earlier one was uploaded again.
    ScanDuplicate {
        digest: ContentDigest,
        original_scan_id: Uuid,
        original_recorded_at: DateTime<Utc>,
    },

    /// A bundle failed validation or processing.
    ScanRejected {
        error_kind: String,
        category: String,
        message: String,
    },

    // =========================================================================
    // Drive Events
    // =========================================================================
    /// A drive record was created.
    DriveCreated {
        drive_id: u64,
        serial: String,
        provenance: DriveProvenance,
        logical_path: Option<String>,
        capacity_bytes: Option<u64>,
        model: Option<String>,
    },

    /// An operator changed a drive's lifecycle status.
    DriveStatusChanged {
        drive_id: u64,
        serial: String,
        from: DriveStatus,
        to: DriveStatus,
        note: String,
    },
}

impl AuditDetail {
    pub fn kind(&self) -> AuditEventKind {
        match self {
            AuditDetail::ScanAccepted { .. } => AuditEventKind::ScanAccepted,
            AuditDetail::ScanDuplicate { .. } => AuditEventKind::ScanDuplicate,
            AuditDetail::ScanRejected { .. } => AuditEventKind::ScanRejected,
            AuditDetail::DriveCreated { .. } => AuditEventKind::DriveCreated,
            AuditDetail::DriveStatusChanged { .. } => AuditEventKind::DriveStatusChanged,
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub asset_id: AssetId,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub detail: AuditDetail,
}

impl AuditEvent {
    /// Wrap a detail payload with identity and time.
    pub fn new(asset_id: AssetId, actor: impl Into<String>, detail: AuditDetail) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id,
            actor: actor.into(),
            timestamp: Utc::now(),
            detail,
        }
    }

    pub fn kind(&self) -> AuditEventKind {
        self.detail.kind()
    }
}

// =============================================================================
// Event Builders
// =============================================================================

impl AuditEvent {
    /// Create a scan-accepted event.
    pub fn scan_accepted(
        receipt: &ScanReceipt,
        actor: impl Into<String>,
        drives_reported: usize,
        drives_created: usize,
        parse_warnings: usize,
    ) -> Self {
        Self::new(
            receipt.asset_id.clone(),
            actor,
            AuditDetail::ScanAccepted {
                scan_id: receipt.scan_id,
                digest: receipt.digest.clone(),
                drives_reported,
                drives_created,
                parse_warnings,
            },
        )
    }

    /// Create a scan-duplicate event pointing at the original receipt.
    pub fn scan_duplicate(original: &ScanReceipt, actor: impl Into<String>) -> Self {
        Self::new(
            original.asset_id.clone(),
            actor,
            AuditDetail::ScanDuplicate {
                digest: original.digest.clone(),
                original_scan_id: original.scan_id,
                original_recorded_at: original.recorded_at,
            },
        )
    }

    /// Create a scan-rejected event from the failure.
    pub fn scan_rejected(asset_id: &AssetId, actor: impl Into<String>, error: &Error) -> Self {
        Self::new(
            asset_id.clone(),
            actor,
            AuditDetail::ScanRejected {
                error_kind: error.kind().to_string(),
                category: error.category().to_string(),
                message: error.to_string(),
            },
        )
    }

    /// Create a drive-created event.
    pub fn drive_created(record: &DriveRecord, actor: impl Into<String>) -> Self {
        Self::new(
            record.asset_id.clone(),
            actor,
            AuditDetail::DriveCreated {
                drive_id: record.id,
                serial: record.serial.clone(),
                provenance: record.provenance,
                logical_path: record.logical_path.clone(),
                capacity_bytes: record.capacity_bytes,
                model: record.model.clone(),
            },
        )
    }

    /// Create a drive-status-changed event.
    pub fn drive_status_changed(
        record: &DriveRecord,
        from: DriveStatus,
        actor: impl Into<String>,
    ) -> Self {
        Self::new(
            record.asset_id.clone(),
            actor,
            AuditDetail::DriveStatusChanged {
                drive_id: record.id,
                serial: record.serial.clone(),
                from,
                to: record.status,
                note: record.status_note.clone(),
            },
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
