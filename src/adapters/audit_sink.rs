//! Audit Sink Adapters
//!
//! Implement the `AuditSink` port: a tracing mirror, an in-memory log that
//! doubles as the activity-log query surface in tests and the CLI, and a
//! fan-out composite.

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info};

use crate::domain::events::{AuditEvent, AuditEventKind};
use crate::domain::ports::{AssetId, AuditSink};
use crate::error::{Error, Result};

/// Writes audit events to the tracing system.
#[derive(Debug, Clone, Default)]
pub struct LoggingAuditSink {
    /// Log at info level (true) or debug level (false)
    info_level: bool,
}

impl LoggingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that logs at info level.
    pub fn info_level() -> Self {
        Self { info_level: true }
    }

    /// Create a sink that logs at debug level.
    pub fn debug_level() -> Self {
        Self { info_level: false }
    }
}

#[async_trait]
impl AuditSink for LoggingAuditSink {
    async fn append(&self, event: AuditEvent) -> Result<()> {
        let kind = event.kind();
        let detail =
            serde_json::to_string(&event.detail).unwrap_or_else(|_| format!("{:?}", event.detail));

        if self.info_level {
            info!(kind = %kind, asset_id = %event.asset_id, actor = %event.actor, detail = %detail, "Audit event");
        } else {
            debug!(kind = %kind, asset_id = %event.asset_id, actor = %event.actor, detail = %detail, "Audit event");
        }

        Ok(())
    }
}

/// Append-only in-memory audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    events: parking_lot::RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in append order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Events of one kind.
    pub fn events_of_kind(&self, kind: AuditEventKind) -> Vec<AuditEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }

    /// Activity log of one asset, newest first.
    pub fn events_for_asset(&self, asset_id: &AssetId) -> Vec<AuditEvent> {
        self.events
            .read()
            .iter()
            .rev()
            .filter(|e| e.asset_id == *asset_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn append(&self, event: AuditEvent) -> Result<()> {
        self.events.write().push(event);
        Ok(())
    }

    async fn append_all(&self, events: Vec<AuditEvent>) -> Result<()> {
        self.events.write().extend(events);
        Ok(())
    }
}

/// Fans each event out to several sinks.
///
/// Every sink is attempted; the first failure is returned afterwards.
#[derive(Default)]
pub struct CompositeAuditSink {
    sinks: Vec<Box<dyn AuditSink>>,
}

impl CompositeAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink to the composite.
    pub fn with_sink<S: AuditSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for CompositeAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeAuditSink")
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

fn first_error(results: Vec<Result<()>>) -> Result<()> {
    results.into_iter().collect::<Result<Vec<()>>>().map(|_| ())
}

#[async_trait]
impl AuditSink for CompositeAuditSink {
    async fn append(&self, event: AuditEvent) -> Result<()> {
        let results = join_all(self.sinks.iter().map(|s| s.append(event.clone()))).await;
        first_error(results)
    }

    async fn append_all(&self, events: Vec<AuditEvent>) -> Result<()> {
        let results = join_all(self.sinks.iter().map(|s| s.append_all(events.clone()))).await;
        first_error(results)
    }
}

/// Sink that rejects every append; stands in for an unreachable audit store.
#[derive(Debug, Clone, Default)]
pub struct UnavailableAuditSink;

#[async_trait]
impl AuditSink for UnavailableAuditSink {
    async fn append(&self, _event: AuditEvent) -> Result<()> {
        Err(Error::StoreUnavailable("audit log is unavailable".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ContentDigest, ScanReceipt};
    use std::sync::Arc;

    fn accepted(asset: &str) -> AuditEvent {
        let receipt = ScanReceipt::new(AssetId::new(asset), ContentDigest::from_bytes(&[1u8; 32]));
        AuditEvent::scan_accepted(&receipt, "tech", 1, 1, 0)
    }

    fn duplicate(asset: &str) -> AuditEvent {
        let receipt = ScanReceipt::new(AssetId::new(asset), ContentDigest::from_bytes(&[1u8; 32]));
        AuditEvent::scan_duplicate(&receipt, "tech")
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingAuditSink::new();

        // Should not panic
        sink.append(accepted("A-1")).await.unwrap();
        LoggingAuditSink::info_level()
            .append(duplicate("A-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_in_memory_log() {
        let log = InMemoryAuditLog::new();
        assert!(log.is_empty());

        log.append(accepted("A-1")).await.unwrap();
        log.append_all(vec![duplicate("A-1"), accepted("A-2")])
            .await
            .unwrap();

        assert_eq!(log.len(), 3);
        assert_eq!(log.events_of_kind(AuditEventKind::ScanAccepted).len(), 2);

        let activity = log.events_for_asset(&AssetId::new("A-1"));
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].kind(), AuditEventKind::ScanDuplicate);
    }

    #[tokio::test]
    async fn test_composite_reaches_every_sink() {
        let log = Arc::new(InMemoryAuditLog::new());
        let composite = CompositeAuditSink::new()
            .with_sink(LoggingAuditSink::debug_level())
            .with_sink(UnavailableAuditSink)
            .with_sink(log.clone());

        assert_eq!(composite.len(), 3);
        let err = composite.append(accepted("A-1")).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(log.len(), 1);
    }
}
