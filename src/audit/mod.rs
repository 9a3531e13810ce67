//! Audit Emitter
//!
//! Records one immutable event per state-changing outcome. Emission is
//! best-effort: a sink failure is logged and counted, never returned, so it
//! cannot undo side effects that are already committed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::domain::events::{AuditDetail, AuditEvent};
use crate::domain::ports::{AssetId, AuditSink};

/// Best-effort front end to an [`AuditSink`].
#[derive(Clone)]
pub struct AuditEmitter {
    sink: Arc<dyn AuditSink>,
    failures: Arc<AtomicU64>,
}

impl std::fmt::Debug for AuditEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditEmitter")
            .field("failures", &self.failures())
            .finish()
    }
}

impl AuditEmitter {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Append an event built from its parts. Returns whether it was stored.
    pub async fn record(
        &self,
        asset_id: &AssetId,
        actor: impl Into<String>,
        detail: AuditDetail,
    ) -> bool {
        self.emit(AuditEvent::new(asset_id.clone(), actor, detail))
            .await
    }

    /// Append a prepared event. Returns whether it was stored.
    pub async fn emit(&self, event: AuditEvent) -> bool {
        let kind = event.kind();
        let asset_id = event.asset_id.clone();
        match self.sink.append(event).await {
            Ok(()) => true,
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(kind = %kind, asset_id = %asset_id, error = %e, "Failed to record audit event");
                false
            }
        }
    }

    /// Append several events in order. Returns whether all were stored.
    pub async fn emit_all(&self, events: Vec<AuditEvent>) -> bool {
        if events.is_empty() {
            return true;
        }
        let count = events.len();
        match self.sink.append_all(events).await {
            Ok(()) => true,
            Err(e) => {
                self.failures.fetch_add(count as u64, Ordering::Relaxed);
                warn!(count, error = %e, "Failed to record audit events");
                false
            }
        }
    }

    /// Events that could not be stored since creation.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
