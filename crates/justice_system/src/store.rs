//! In-memory ban set backed by durable storage.
//!
//! Lookups never touch the disk. A ban becomes effective in memory before it
//! is written, and a failed write does not take it back out.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::StorageResult;
use crate::storage::ExclusionBackend;
use crate::types::{ExclusionRecord, Identity};

/// All permanent bans, keyed by offender identity
#[derive(Debug)]
pub struct ExclusionStore {
    records: DashMap<Identity, Arc<ExclusionRecord>>,
    backend: Box<dyn ExclusionBackend>,
}

impl ExclusionStore {
    /// Build the store and load every persisted ban from `backend`
    pub fn open(backend: Box<dyn ExclusionBackend>) -> StorageResult<Self> {
        let store = Self {
            records: DashMap::new(),
            backend,
        };

        for record in store.backend.load_all()? {
            let identity = record.offender_identity.clone();
            if store.records.insert(identity.clone(), Arc::new(record)).is_some() {
                warn!("Multiple ban records found for {}, keeping the last one", identity);
            }
        }

        info!("Loaded {} bans.", store.records.len());
        Ok(store)
    }

    /// Whether `identity` is permanently banned
    pub fn is_excluded(&self, identity: &Identity) -> bool {
        self.records.contains_key(identity)
    }

    /// Ban record for `identity`, if any
    pub fn get(&self, identity: &Identity) -> Option<Arc<ExclusionRecord>> {
        self.records.get(identity).map(|record| record.clone())
    }

    /// All bans currently in effect
    pub fn records(&self) -> Vec<Arc<ExclusionRecord>> {
        self.records.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a ban and persist it.
    ///
    /// Returns `Ok(false)` without writing anything when the identity is
    /// already banned. On a write error the ban stays in effect in memory
    /// and the error is returned for the caller to report.
    pub fn add(&self, record: ExclusionRecord) -> StorageResult<bool> {
        let record = Arc::new(record);

        match self.records.entry(record.offender_identity.clone()) {
            Entry::Occupied(_) => {
                debug!("{} is already banned", record.offender_identity);
                return Ok(false);
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
            }
        }

        if let Err(e) = self.backend.save(&record) {
            error!(
                "Failed to persist ban for {} ({}); ban is active until restart: {}",
                record.offender_display_name, record.offender_identity, e
            );
            return Err(e);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::JsonExclusionBackend;
    use crate::types::ComplaintRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn ban(identity: &str, name: &str) -> ExclusionRecord {
        ComplaintRecord::new(identity.into(), name, "10.0.0.1".into(), "cheating").into_exclusion()
    }

    #[derive(Debug, Default)]
    struct FailingBackend {
        saves: AtomicUsize,
    }

    impl ExclusionBackend for FailingBackend {
        fn load_all(&self) -> StorageResult<Vec<ExclusionRecord>> {
            Ok(Vec::new())
        }

        fn save(&self, record: &ExclusionRecord) -> StorageResult<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::FileCreate(
                format!("ban-{}.tmp", record.offender_identity).into(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }
    }

    #[test]
    fn test_add_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let store = ExclusionStore::open(Box::new(JsonExclusionBackend::new(dir.path()).unwrap())).unwrap();
        assert!(store.is_empty());

        assert!(store.add(ban("10.0.0.9", "Bob")).unwrap());
        assert!(store.is_excluded(&"10.0.0.9".into()));
        assert!(!store.is_excluded(&"10.0.0.8".into()));

        let reopened = ExclusionStore::open(Box::new(JsonExclusionBackend::new(dir.path()).unwrap())).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get(&"10.0.0.9".into()).unwrap().offender_display_name, "Bob");
    }

    #[test]
    fn test_add_is_insert_if_absent() {
        let dir = TempDir::new().unwrap();
        let store = ExclusionStore::open(Box::new(JsonExclusionBackend::new(dir.path()).unwrap())).unwrap();

        assert!(store.add(ban("10.0.0.9", "Bob")).unwrap());
        assert!(!store.add(ban("10.0.0.9", "Robert")).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&"10.0.0.9".into()).unwrap().offender_display_name, "Bob");
    }

    #[test]
    fn test_write_failure_keeps_ban_in_memory() {
        let store = ExclusionStore::open(Box::new(FailingBackend::default())).unwrap();

        let result = store.add(ban("10.0.0.9", "Bob"));
        assert!(matches!(result, Err(StorageError::FileCreate(..))));
        assert!(store.is_excluded(&"10.0.0.9".into()));
        assert_eq!(store.records().len(), 1);
    }
}
