//! Domain Layer
//!
//! Value objects, persistence ports and audit events of the intake domain.
//!
//! - **Ports** (`ports.rs`) - Trait abstractions over the dedup ledger, the
//!   drive inventory and the audit log
//! - **Events** (`events.rs`) - Audit events for state-changing outcomes
//!
//! # Usage
//!
//! ```ignore
//! use scan_intake::domain::{AssetId, DigestLedger, LedgerInsert};
//!
//! async fn is_new<L: DigestLedger>(ledger: &L, asset: &AssetId, digest: &ContentDigest) -> Result<bool> {
//!     Ok(matches!(ledger.record_if_absent(asset, digest).await?, LedgerInsert::Inserted(_)))
//! }
//! ```

pub mod events;
pub mod ports;

pub use events::{AuditDetail, AuditEvent, AuditEventKind};
pub use ports::{
    AssetId,
    AuditSink,
    ContentDigest,
    DigestLedger,
    DriveProvenance,
    DriveRecord,
    DriveRepository,
    DriveStatus,
    LedgerInsert,
    ManualDrive,
    ScanReceipt,
    ScannedDrive,
    StatusUpdate,
    UpsertOutcome,
};
