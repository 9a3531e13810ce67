//! Drive Reconciler
//!
//! Merges the drive facts of an accepted scan into the per-asset drive
//! inventory and owns the operator-driven lifecycle changes.
//!
//! # Rules
//!
//! - A fact without a usable serial is skipped; it never becomes a record.
//! - Within one scan a serial is reconciled once. The first fact carrying it
//!   wins, which for NVMe is the controller listed before its namespaces.
//! - A known `(asset, serial)` has its path, capacity, model and last-seen
//!   time refreshed. Status, note, actor and provenance are left alone, so a
//!   re-scan never resets a wiped drive to present.
//! - Status changes happen only through [`DriveReconciler::change_status`].
//! - Reads are never audited; every write is.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::audit::AuditEmitter;
use crate::domain::events::AuditEvent;
use crate::domain::ports::{
    AssetId, DriveRecord, DriveRepository, DriveStatus, ManualDrive, ScannedDrive, StatusUpdate,
    UpsertOutcome,
};
use crate::error::{Error, Result};
use crate::hardware::{is_placeholder_serial, DriveFact};

/// What one reconciliation did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Serials of newly created records
    pub created: Vec<String>,
    /// Serials of existing records refreshed by this scan
    pub refreshed: Vec<String>,
    /// Facts skipped for lacking a serial
    pub skipped_without_serial: usize,
    /// Facts skipped because an earlier fact in the scan had the same serial
    #[serde(default)]
    pub skipped_duplicate_serial: usize,
}

impl ReconcileReport {
    pub fn reconciled(&self) -> usize {
        self.created.len() + self.refreshed.len()
    }
}

/// Drive inventory service over a [`DriveRepository`].
#[derive(Clone)]
pub struct DriveReconciler {
    drives: Arc<dyn DriveRepository>,
    audit: AuditEmitter,
}

impl std::fmt::Debug for DriveReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveReconciler").finish_non_exhaustive()
    }
}

impl DriveReconciler {
    pub fn new(drives: Arc<dyn DriveRepository>, audit: AuditEmitter) -> Self {
        Self { drives, audit }
    }

    // =========================================================================
    // Writes (audited)
    // =========================================================================

    /// Upsert every identifiable fact of one scan.
    ///
    /// Emits `drive-created` per new record and nothing for refreshes. Later
    /// facts repeating a serial already seen in `facts` are skipped. A store
    /// failure aborts the remaining facts and is returned.
    #[instrument(skip(self, facts), fields(asset_id = %asset_id, facts = facts.len()))]
    pub async fn reconcile(
        &self,
        asset_id: &AssetId,
        facts: &[DriveFact],
        actor: &str,
    ) -> Result<ReconcileReport> {
        let seen_at = Utc::now();
        let mut report = ReconcileReport::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(facts.len());

        for fact in facts {
            let Some(serial) = fact.identity() else {
                debug!(logical_path = ?fact.logical_path, "Skipping drive without serial");
                report.skipped_without_serial += 1;
                continue;
            };
            if !seen.insert(serial) {
                debug!(serial, logical_path = ?fact.logical_path, "Skipping repeated serial");
                report.skipped_duplicate_serial += 1;
                continue;
            }

            let scanned = ScannedDrive {
                serial: serial.to_string(),
                logical_path: fact.logical_path.clone(),
                capacity_bytes: fact.capacity_bytes,
                model: fact.model.clone(),
                seen_at,
            };

            match self.drives.upsert_scanned(asset_id, scanned).await? {
                UpsertOutcome::Created(record) => {
                    info!(serial = %record.serial, drive_id = record.id, "Drive created from scan");
                    self.audit
                        .emit(AuditEvent::drive_created(&record, actor))
                        .await;
                    report.created.push(record.serial);
                }
                UpsertOutcome::Refreshed(record) => {
                    debug!(serial = %record.serial, status = %record.status, "Drive refreshed from scan");
                    report.refreshed.push(record.serial);
                }
            }
        }

        Ok(report)
    }

    /// Apply an operator's lifecycle change.
    ///
    /// Fails with `DriveStatusTargetNotFound`, committing nothing, when the
    /// asset has no drive with this serial.
    #[instrument(skip(self, note), fields(asset_id = %asset_id))]
    pub async fn change_status(
        &self,
        asset_id: &AssetId,
        serial: &str,
        status: DriveStatus,
        note: Option<String>,
        actor: &str,
    ) -> Result<DriveRecord> {
        let update = StatusUpdate {
            status,
            note: note.unwrap_or_default(),
            actor: actor.to_string(),
            at: Utc::now(),
        };

        let Some((previous, record)) = self
            .drives
            .update_status(asset_id, serial.trim(), update)
            .await?
        else {
            return Err(Error::DriveStatusTargetNotFound {
                asset_id: asset_id.to_string(),
                serial: serial.to_string(),
            });
        };

        info!(serial = %record.serial, from = %previous, to = %record.status, "Drive status changed");
        self.audit
            .emit(AuditEvent::drive_status_changed(&record, previous, actor))
            .await;
        Ok(record)
    }

    /// Record a drive entered by hand (provenance `manual`).
    #[instrument(skip(self, drive), fields(asset_id = %asset_id, serial = %drive.serial))]
    pub async fn register_manual(
        &self,
        asset_id: &AssetId,
        drive: ManualDrive,
        actor: &str,
    ) -> Result<DriveRecord> {
        if is_placeholder_serial(&drive.serial) {
            return Err(Error::InvalidDrive(format!(
                "'{}' is not a usable serial",
                drive.serial.trim()
            )));
        }

        let record = self
            .drives
            .insert_manual(DriveRecord::manual(asset_id, drive, actor, Utc::now()))
            .await?;

        info!(serial = %record.serial, drive_id = record.id, "Manual drive registered");
        self.audit
            .emit(AuditEvent::drive_created(&record, actor))
            .await;
        Ok(record)
    }

    // =========================================================================
    // Reads (never audited)
    // =========================================================================

    /// Current drives of an asset, in creation order.
    pub async fn drives_for_asset(&self, asset_id: &AssetId) -> Result<Vec<DriveRecord>> {
        self.drives.list_for_asset(asset_id).await
    }

    /// Every record of a serial across assets, newest first.
    pub async fn find_by_serial(&self, serial: &str) -> Result<Vec<DriveRecord>> {
        self.drives.find_by_serial(serial.trim()).await
    }
}
