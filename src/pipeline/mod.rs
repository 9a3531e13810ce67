//! Ingest pipeline
//!
//! Runs one scan bundle through every stage:
//!
//! ```text
//! validate → digest → ledger (conditional insert) → extract → reconcile → audit
//!                          │
//!                          └─ already present → scan-duplicate, stop
//! ```

mod engine;

pub use engine::{AcceptedScan, IngestOutcome, IngestPipeline};
