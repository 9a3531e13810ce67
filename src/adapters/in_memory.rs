//! In-Memory Store Adapters
//!
//! Implement the `DigestLedger` and `DriveRepository` ports on `DashMap`.
//! Conditional inserts go through the entry API, which holds the shard lock
//! for the whole check-and-write, so they are atomic per key.
//!
//! Both adapters can be switched to an unavailable state to exercise the
//! transient-failure path.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    AssetId, ContentDigest, DigestLedger, DriveProvenance, DriveRecord, DriveRepository,
    DriveStatus, LedgerInsert, ScanReceipt, ScannedDrive, StatusUpdate, UpsertOutcome,
};
use crate::error::{Error, Result};

fn check_available(available: &AtomicBool, store: &str) -> Result<()> {
    if available.load(Ordering::Acquire) {
        Ok(())
    } else {
        Err(Error::StoreUnavailable(format!("{} is unavailable", store)))
    }
}

// =============================================================================
// Digest Ledger
// =============================================================================

/// Per-asset digest ledger.
#[derive(Debug)]
pub struct InMemoryDigestLedger {
    receipts: DashMap<(AssetId, ContentDigest), ScanReceipt>,
    available: AtomicBool,
}

impl Default for InMemoryDigestLedger {
    fn default() -> Self {
        Self {
            receipts: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }
}

impl InMemoryDigestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend outage (or recovery).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Number of recorded receipts.
    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Receipts of one asset, oldest first.
    pub fn receipts_for_asset(&self, asset_id: &AssetId) -> Vec<ScanReceipt> {
        let mut receipts: Vec<ScanReceipt> = self
            .receipts
            .iter()
            .filter(|e| e.key().0 == *asset_id)
            .map(|e| e.value().clone())
            .collect();
        receipts.sort_by_key(|r| r.recorded_at);
        receipts
    }
}

#[async_trait]
impl DigestLedger for InMemoryDigestLedger {
    async fn record_if_absent(
        &self,
        asset_id: &AssetId,
        digest: &ContentDigest,
    ) -> Result<LedgerInsert> {
        check_available(&self.available, "digest ledger")?;

        match self.receipts.entry((asset_id.clone(), digest.clone())) {
            Entry::Occupied(existing) => Ok(LedgerInsert::AlreadyPresent(existing.get().clone())),
            Entry::Vacant(slot) => {
                let receipt = ScanReceipt::new(asset_id.clone(), digest.clone());
                slot.insert(receipt.clone());
                Ok(LedgerInsert::Inserted(receipt))
            }
        }
    }

    async fn contains(&self, asset_id: &AssetId, digest: &ContentDigest) -> Result<bool> {
        check_available(&self.available, "digest ledger")?;
        Ok(self
            .receipts
            .contains_key(&(asset_id.clone(), digest.clone())))
    }

    async fn release(
        &self,
        asset_id: &AssetId,
        digest: &ContentDigest,
        scan_id: Uuid,
    ) -> Result<()> {
        check_available(&self.available, "digest ledger")?;
        let removed = self
            .receipts
            .remove_if(&(asset_id.clone(), digest.clone()), |_, r| r.scan_id == scan_id);
        debug!(asset_id = %asset_id, digest = %digest, released = removed.is_some(), "Released scan receipt");
        Ok(())
    }
}

// =============================================================================
// Drive Repository
// =============================================================================

/// Drive records keyed by asset, then serial.
#[derive(Debug)]
pub struct InMemoryDriveRepository {
    drives: DashMap<AssetId, DashMap<String, DriveRecord>>,
    next_id: AtomicU64,
    available: AtomicBool,
}

impl Default for InMemoryDriveRepository {
    fn default() -> Self {
        Self {
            drives: DashMap::new(),
            next_id: AtomicU64::new(1),
            available: AtomicBool::new(true),
        }
    }
}

impl InMemoryDriveRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend outage (or recovery).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Total number of records across all assets.
    pub fn len(&self) -> usize {
        self.drives.iter().map(|asset| asset.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl DriveRepository for InMemoryDriveRepository {
    async fn upsert_scanned(
        &self,
        asset_id: &AssetId,
        drive: ScannedDrive,
    ) -> Result<UpsertOutcome> {
        check_available(&self.available, "drive repository")?;

        let asset_drives = self.drives.entry(asset_id.clone()).or_default();
        let outcome = match asset_drives.entry(drive.serial.clone()) {
            Entry::Occupied(mut existing) => {
                let record = existing.get_mut();
                record.logical_path = drive.logical_path;
                record.capacity_bytes = drive.capacity_bytes;
                record.model = drive.model;
                record.last_seen_at = Some(drive.seen_at);
                UpsertOutcome::Refreshed(record.clone())
            }
            Entry::Vacant(slot) => {
                let record = DriveRecord {
                    id: self.allocate_id(),
                    asset_id: asset_id.clone(),
                    serial: drive.serial,
                    logical_path: drive.logical_path,
                    capacity_bytes: drive.capacity_bytes,
                    model: drive.model,
                    provenance: DriveProvenance::Scan,
                    status: DriveStatus::Present,
                    status_note: String::new(),
                    status_by: None,
                    status_at: drive.seen_at,
                    created_at: drive.seen_at,
                    last_seen_at: Some(drive.seen_at),
                };
                slot.insert(record.clone());
                UpsertOutcome::Created(record)
            }
        };
        Ok(outcome)
    }

    async fn insert_manual(&self, mut record: DriveRecord) -> Result<DriveRecord> {
        check_available(&self.available, "drive repository")?;

        let asset_drives = self.drives.entry(record.asset_id.clone()).or_default();
        let inserted = match asset_drives.entry(record.serial.clone()) {
            Entry::Occupied(_) => Err(Error::DriveAlreadyExists {
                asset_id: record.asset_id.to_string(),
                serial: record.serial,
            }),
            Entry::Vacant(slot) => {
                record.id = self.allocate_id();
                slot.insert(record.clone());
                Ok(record)
            }
        };
        inserted
    }

    async fn get(&self, asset_id: &AssetId, serial: &str) -> Result<Option<DriveRecord>> {
        check_available(&self.available, "drive repository")?;
        Ok(self
            .drives
            .get(asset_id)
            .and_then(|drives| drives.get(serial).map(|r| r.value().clone())))
    }

    async fn list_for_asset(&self, asset_id: &AssetId) -> Result<Vec<DriveRecord>> {
        check_available(&self.available, "drive repository")?;
        let mut records: Vec<DriveRecord> = match self.drives.get(asset_id) {
            Some(drives) => drives.iter().map(|r| r.value().clone()).collect(),
            None => Vec::new(),
        };
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn find_by_serial(&self, serial: &str) -> Result<Vec<DriveRecord>> {
        check_available(&self.available, "drive repository")?;
        let mut records: Vec<DriveRecord> = self
            .drives
            .iter()
            .filter_map(|asset| asset.value().get(serial).map(|r| r.value().clone()))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn update_status(
        &self,
        asset_id: &AssetId,
        serial: &str,
        update: StatusUpdate,
    ) -> Result<Option<(DriveStatus, DriveRecord)>> {
        check_available(&self.available, "drive repository")?;

        let Some(drives) = self.drives.get(asset_id) else {
            return Ok(None);
        };
        let Some(mut record) = drives.get_mut(serial) else {
            return Ok(None);
        };

        let previous = record.status;
        record.status = update.status;
        record.status_note = update.note;
        record.status_by = Some(update.actor);
        record.status_at = update.at;
        Ok(Some((previous, record.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::ports::ManualDrive;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn digest(byte: u8) -> ContentDigest {
        ContentDigest::from_bytes(&[byte; 32])
    }

    fn scanned(serial: &str, path: &str) -> ScannedDrive {
        ScannedDrive {
            serial: serial.to_string(),
            logical_path: Some(path.to_string()),
            capacity_bytes: Some(1 << 30),
            model: Some("DISK".to_string()),
            seen_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ledger_conditional_insert() {
        let ledger = InMemoryDigestLedger::new();
        let asset = AssetId::new("A-1");

        let first = ledger.record_if_absent(&asset, &digest(1)).await.unwrap();
        let LedgerInsert::Inserted(receipt) = first else {
            panic!("first insert must win");
        };

        let second = ledger.record_if_absent(&asset, &digest(1)).await.unwrap();
        assert_eq!(second, LedgerInsert::AlreadyPresent(receipt.clone()));
        assert!(ledger.contains(&asset, &digest(1)).await.unwrap());

        // Same digest, other asset: independent.
        let other = ledger
            .record_if_absent(&AssetId::new("A-2"), &digest(1))
            .await
            .unwrap();
        assert_matches!(other, LedgerInsert::Inserted(_));
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn test_ledger_concurrent_insert_has_one_winner() {
        let ledger = Arc::new(InMemoryDigestLedger::new());
        let asset = AssetId::new("A-1");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = ledger.clone();
                let asset = asset.clone();
                tokio::spawn(async move { ledger.record_if_absent(&asset, &digest(9)).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if let LedgerInsert::Inserted(_) = handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_ledger_release_requires_matching_scan() {
        let ledger = InMemoryDigestLedger::new();
        let asset = AssetId::new("A-1");
        ledger.record_if_absent(&asset, &digest(2)).await.unwrap();

        ledger.release(&asset, &digest(2), Uuid::new_v4()).await.unwrap();
        assert!(ledger.contains(&asset, &digest(2)).await.unwrap());

        let receipt = ledger.receipts_for_asset(&asset).remove(0);
        ledger.release(&asset, &digest(2), receipt.scan_id).await.unwrap();
        assert!(!ledger.contains(&asset, &digest(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_ledger() {
        let ledger = InMemoryDigestLedger::new();
        ledger.set_available(false);

        let err = ledger
            .record_if_absent(&AssetId::new("A-1"), &digest(3))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_upsert_creates_then_refreshes() {
        let repo = InMemoryDriveRepository::new();
        let asset = AssetId::new("A-1");

        let created = repo.upsert_scanned(&asset, scanned("SN-1", "/dev/sda")).await.unwrap();
        assert!(created.is_created());
        assert_eq!(created.record().status, DriveStatus::Present);

        let refreshed = repo.upsert_scanned(&asset, scanned("SN-1", "/dev/sdb")).await.unwrap();
        assert!(!refreshed.is_created());
        assert_eq!(refreshed.record().id, created.record().id);
        assert_eq!(refreshed.record().logical_path.as_deref(), Some("/dev/sdb"));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_lifecycle_fields() {
        let repo = InMemoryDriveRepository::new();
        let asset = AssetId::new("A-1");
        repo.upsert_scanned(&asset, scanned("SN-1", "/dev/sda")).await.unwrap();

        let update = StatusUpdate {
            status: DriveStatus::Wiped,
            note: "DoD 3-pass".to_string(),
            actor: "tech-4".to_string(),
            at: Utc::now(),
        };
        let (previous, _) = repo.update_status(&asset, "SN-1", update).await.unwrap().unwrap();
        assert_eq!(previous, DriveStatus::Present);

        let refreshed = repo.upsert_scanned(&asset, scanned("SN-1", "/dev/sda")).await.unwrap();
        let record = refreshed.record();
        assert_eq!(record.status, DriveStatus::Wiped);
        assert_eq!(record.status_note, "DoD 3-pass");
        assert_eq!(record.status_by.as_deref(), Some("tech-4"));
    }

    #[tokio::test]
    async fn test_concurrent_upserts_create_one_record() {
        let repo = Arc::new(InMemoryDriveRepository::new());
        let asset = AssetId::new("A-1");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo = repo.clone();
                let asset = asset.clone();
                tokio::spawn(async move { repo.upsert_scanned(&asset, scanned("SN-X", "/dev/sda")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_created() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(repo.list_for_asset(&asset).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_manual_insert_collision() {
        let repo = InMemoryDriveRepository::new();
        let asset = AssetId::new("A-1");

        let record = DriveRecord::manual(&asset, ManualDrive::new("MANUAL-1"), "tech", Utc::now());
        let inserted = repo.insert_manual(record.clone()).await.unwrap();
        assert!(inserted.id > 0);
        assert_eq!(inserted.provenance, DriveProvenance::Manual);

        assert_matches!(
            repo.insert_manual(record).await,
            Err(Error::DriveAlreadyExists { .. })
        );
    }

    #[tokio::test]
    async fn test_update_status_unknown_identity() {
        let repo = InMemoryDriveRepository::new();
        let update = StatusUpdate {
            status: DriveStatus::Shredded,
            note: String::new(),
            actor: "tech".to_string(),
            at: Utc::now(),
        };
        assert!(repo
            .update_status(&AssetId::new("A-1"), "NOPE", update)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_by_serial_across_assets() {
        let repo = InMemoryDriveRepository::new();
        repo.upsert_scanned(&AssetId::new("A-1"), scanned("MOVED-1", "/dev/sda")).await.unwrap();
        repo.upsert_scanned(&AssetId::new("A-2"), scanned("MOVED-1", "/dev/sdb")).await.unwrap();
        repo.upsert_scanned(&AssetId::new("A-2"), scanned("OTHER", "/dev/sdc")).await.unwrap();

        let found = repo.find_by_serial("MOVED-1").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].asset_id, AssetId::new("A-2"));
    }

    #[tokio::test]
    async fn test_list_in_creation_order() {
        let repo = InMemoryDriveRepository::new();
        let asset = AssetId::new("A-1");
        for serial in ["C", "A", "B"] {
            repo.upsert_scanned(&asset, scanned(serial, "/dev/sda")).await.unwrap();
        }
        let serials: Vec<String> = repo
            .list_for_asset(&asset)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.serial)
            .collect();
        assert_eq!(serials, vec!["C", "A", "B"]);
    }
}
