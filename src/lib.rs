//! Scan Intake - hardware scan bundle ingestion
//!
//! Ingests scan bundles uploaded by field technicians, deduplicates them by
//! content, extracts structured hardware facts from the hardware-lister tree,
//! and keeps a per-asset inventory of physical drives whose lifecycle status
//! survives repeated re-scans.
//!
//! # Architecture
//!
//! ```text
//! BundleValidator → Canonicalizer → DigestLedger → HardwareExtractor → DriveReconciler
//!                                        │                                   │
//!                                        └──────────── AuditEmitter ─────────┘
//! ```
//!
//! Persistence is reached only through the port traits in [`domain::ports`];
//! [`adapters`] provides in-memory implementations.
//!
//! # Modules
//!
//! - [`adapters`] - Port implementations
//! - [`audit`] - Best-effort audit event emission
//! - [`bundle`] - Bundle model, validation and content digest
//! - [`config`] - Pipeline configuration
//! - [`domain`] - Value objects, ports and audit events
//! - [`error`] - Error types
//! - [`hardware`] - Hardware facts and the lshw extractor
//! - [`metrics`] - Prometheus metrics
//! - [`pipeline`] - The ingest pipeline
//! - [`reconciler`] - Drive inventory reconciliation

pub mod adapters;
pub mod audit;
pub mod bundle;
pub mod config;
pub mod domain;
pub mod error;
pub mod hardware;
pub mod metrics;
pub mod pipeline;
pub mod reconciler;

// Re-export commonly used types
pub use audit::AuditEmitter;
pub use bundle::{BundleValidator, Canonicalizer, ScanBundle};
pub use config::PipelineConfig;
pub use domain::{AssetId, ContentDigest, DriveRecord, DriveStatus, ScanReceipt};
pub use error::{Error, ErrorCategory, Result};
pub use hardware::{HardwareExtractor, HardwareSummary};
pub use metrics::IngestMetrics;
pub use pipeline::{AcceptedScan, IngestOutcome, IngestPipeline};
pub use reconciler::{DriveReconciler, ReconcileReport};
