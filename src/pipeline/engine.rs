//! Pipeline engine
//!
//! # Guarantees
//!
//! 1. Validation and size failures stop the run before anything is persisted
//! 2. Only the caller that wins the ledger insert extracts and reconciles
//! 3. A fatal failure after the insert releases the receipt, so a retry is
//!    not reported as a duplicate
//! 4. Every outcome, including rejection, leaves one scan-level audit event

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::audit::AuditEmitter;
use crate::bundle::{BundleValidator, Canonicalizer, Intake, ScanBundle, SourceStatus};
use crate::config::PipelineConfig;
use crate::domain::events::AuditEvent;
use crate::domain::ports::{
    AssetId, AuditSink, ContentDigest, DigestLedger, DriveRecord, DriveRepository, DriveStatus,
    LedgerInsert, ManualDrive, ScanReceipt,
};
use crate::error::{Error, Result};
use crate::hardware::{HardwareExtractor, HardwareSummary};
use crate::metrics::{BundleOutcome, IngestMetrics};
use crate::reconciler::{DriveReconciler, ReconcileReport};

/// Result of a newly accepted bundle.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedScan {
    pub receipt: ScanReceipt,
    pub intake: Intake,
    pub summary: HardwareSummary,
    pub drives: ReconcileReport,
    /// Per-source tool status, verbatim from the bundle
    pub source_status: BTreeMap<String, SourceStatus>,
}

/// What happened to one upload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// First time this content was seen for the asset
    Accepted(Box<AcceptedScan>),
    /// Identical content was accepted before; nothing ran
    Duplicate {
        /// Receipt of the original acceptance
        receipt: ScanReceipt,
    },
}

impl IngestOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, IngestOutcome::Duplicate { .. })
    }

    pub fn receipt(&self) -> &ScanReceipt {
        match self {
            IngestOutcome::Accepted(scan) => &scan.receipt,
            IngestOutcome::Duplicate { receipt } => receipt,
        }
    }

    pub fn digest(&self) -> &ContentDigest {
        &self.receipt().digest
    }
}

/// Scan intake pipeline.
///
/// Holds no per-request state; concurrent calls for different assets are
/// independent, and calls for the same asset are serialized only by the
/// ledger and the drive repository.
pub struct IngestPipeline {
    config: PipelineConfig,
    validator: BundleValidator,
    canonicalizer: Canonicalizer,
    extractor: HardwareExtractor,
    ledger: Arc<dyn DigestLedger>,
    reconciler: DriveReconciler,
    audit: AuditEmitter,
    metrics: IngestMetrics,
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl IngestPipeline {
    pub fn new(
        config: PipelineConfig,
        ledger: Arc<dyn DigestLedger>,
        drives: Arc<dyn DriveRepository>,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Result<Self> {
        config.validate()?;

        let audit = AuditEmitter::new(audit_sink);
        Ok(Self {
            validator: BundleValidator::from_config(&config),
            canonicalizer: Canonicalizer::new(),
            extractor: HardwareExtractor::new(&config.extractor),
            reconciler: DriveReconciler::new(drives, audit.clone()),
            ledger,
            audit,
            metrics: IngestMetrics::new()?,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }

    pub fn reconciler(&self) -> &DriveReconciler {
        &self.reconciler
    }

    // =========================================================================
    // Ingest
    // =========================================================================

    /// Process one raw upload for the asset the caller expects.
    ///
    /// Errors are fatal for this upload only. `Error::is_transient` tells a
    /// caller whether retrying can help.
    #[instrument(skip(self, raw), fields(asset_id = %expected, bytes = raw.len()))]
    pub async fn ingest(
        &self,
        expected: &AssetId,
        raw: &[u8],
        actor: &str,
    ) -> Result<IngestOutcome> {
        let started = Instant::now();
        let result = self.run(expected, raw, actor).await;

        match &result {
            Ok(IngestOutcome::Accepted(scan)) => {
                self.metrics
                    .record_bundle(BundleOutcome::Accepted, started.elapsed());
                info!(
                    scan_id = %scan.receipt.scan_id,
                    digest = %scan.receipt.digest,
                    drives_created = scan.drives.created.len(),
                    warnings = scan.summary.warnings.len(),
                    "Scan accepted"
                );
            }
            Ok(IngestOutcome::Duplicate { receipt }) => {
                self.metrics
                    .record_bundle(BundleOutcome::Duplicate, started.elapsed());
                info!(
                    original_scan_id = %receipt.scan_id,
                    digest = %receipt.digest,
                    "Duplicate scan ignored"
                );
            }
            Err(e) => {
                self.metrics
                    .record_bundle(BundleOutcome::Rejected, started.elapsed());
                warn!(kind = e.kind(), category = %e.category(), error = %e, "Scan rejected");
                self.audit
                    .emit(AuditEvent::scan_rejected(expected, actor, e))
                    .await;
            }
        }

        result
    }

    async fn run(&self, expected: &AssetId, raw: &[u8], actor: &str) -> Result<IngestOutcome> {
        let bundle = self.validator.validate_bytes(raw, expected)?;
        let digest = self.canonicalizer.digest(&bundle)?;

        let receipt = match self.ledger.record_if_absent(expected, &digest).await? {
            LedgerInsert::AlreadyPresent(original) => {
                self.audit
                    .emit(AuditEvent::scan_duplicate(&original, actor))
                    .await;
                return Ok(IngestOutcome::Duplicate { receipt: original });
            }
            LedgerInsert::Inserted(receipt) => receipt,
        };

        match self.process(bundle, &receipt, actor).await {
            Ok(scan) => Ok(IngestOutcome::Accepted(Box::new(scan))),
            Err(e) => {
                self.release(&receipt).await;
                Err(e)
            }
        }
    }

    /// Extract and reconcile a bundle this call won the ledger insert for.
    async fn process(
        &self,
        bundle: ScanBundle,
        receipt: &ScanReceipt,
        actor: &str,
    ) -> Result<AcceptedScan> {
        let summary = self.extractor.extract_bundle(&bundle)?;
        for warning in &summary.warnings {
            warn!(category = ?warning.category, node = %warning.node_path, "{}", warning.message);
        }

        let drives = self
            .reconciler
            .reconcile(&receipt.asset_id, &summary.drives, actor)
            .await?;

        self.metrics.record_drives_created(drives.created.len());
        self.metrics.record_parse_warnings(summary.warnings.len());
        self.audit
            .emit(AuditEvent::scan_accepted(
                receipt,
                actor,
                summary.drives.len(),
                drives.created.len(),
                summary.warnings.len(),
            ))
            .await;

        Ok(AcceptedScan {
            receipt: receipt.clone(),
            intake: bundle.intake,
            summary,
            drives,
            source_status: bundle.status,
        })
    }

    async fn release(&self, receipt: &ScanReceipt) {
        if let Err(e) = self
            .ledger
            .release(&receipt.asset_id, &receipt.digest, receipt.scan_id)
            .await
        {
            warn!(scan_id = %receipt.scan_id, error = %e, "Failed to release scan receipt");
        }
    }

    // =========================================================================
    // Drive lifecycle
    // =========================================================================

    /// Change the lifecycle status of one drive of an asset.
    pub async fn change_status(
        &self,
        asset_id: &AssetId,
        serial: &str,
        status: DriveStatus,
        note: Option<String>,
        actor: &str,
    ) -> Result<DriveRecord> {
        self.reconciler
            .change_status(asset_id, serial, status, note, actor)
            .await
    }

    /// Record a drive entered by hand.
    pub async fn register_manual(
        &self,
        asset_id: &AssetId,
        drive: ManualDrive,
        actor: &str,
    ) -> Result<DriveRecord> {
        let record = self
            .reconciler
            .register_manual(asset_id, drive, actor)
            .await?;
        self.metrics.record_drives_created(1);
        Ok(record)
    }

    pub async fn drives_for_asset(&self, asset_id: &AssetId) -> Result<Vec<DriveRecord>> {
        self.reconciler.drives_for_asset(asset_id).await
    }

    pub async fn find_by_serial(&self, serial: &str) -> Result<Vec<DriveRecord>> {
        self.reconciler.find_by_serial(serial).await
    }

    /// Whether this exact content was already accepted for the asset.
    pub async fn is_known(&self, asset_id: &AssetId, raw: &[u8]) -> Result<bool> {
        let bundle = self.validator.validate_bytes(raw, asset_id)?;
        let digest = self.canonicalizer.digest(&bundle)?;
        self.ledger.contains(asset_id, &digest).await
    }
}
