//! Infrastructure Adapters
//!
//! This module contains adapter implementations for the domain ports,
//! following the Port/Adapter (Hexagonal) architecture pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                              │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │                    Ports (Traits)                           │ │
//! │  │      DigestLedger │ DriveRepository │ AuditSink             │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters (This Module)                       │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │ InMemoryDigestLedger │ InMemoryDriveRepository             │ │
//! │  │ LoggingAuditSink │ InMemoryAuditLog │ CompositeAuditSink    │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use scan_intake::adapters::{InMemoryDigestLedger, InMemoryDriveRepository, LoggingAuditSink};
//!
//! let pipeline = IngestPipeline::new(
//!     PipelineConfig::default(),
//!     Arc::new(InMemoryDigestLedger::new()),
//!     Arc::new(InMemoryDriveRepository::new()),
//!     Arc::new(LoggingAuditSink::info_level()),
//! )?;
//! ```

mod audit_sink;
mod in_memory;

pub use audit_sink::{CompositeAuditSink, InMemoryAuditLog, LoggingAuditSink, UnavailableAuditSink};
pub use in_memory::{InMemoryDigestLedger, InMemoryDriveRepository};
