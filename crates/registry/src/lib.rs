//! In-process [`VendorStore`], optionally backed by a JSONL journal.

pub mod journal;

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use vendor_onboarding::{
    SortKey, SortOrder, StoreError, VendorDraft, VendorFilter, VendorListing, VendorRecord,
    VendorStore, format_vendor_id, sort_records, to_csv, vendor_sequence,
};

pub use journal::{RegistryChange, RegistryEvent, RegistryJournal};

pub const DUPLICATE_EMAIL: &str = "Vendor with this email already exists";

#[derive(Debug, Default)]
struct RegistryState {
    records: Vec<VendorRecord>,
    /// Highest sequence ever issued; never decreases.
    sequence: u64,
}

impl RegistryState {
    fn apply(&mut self, change: RegistryChange) {
        match change {
            RegistryChange::Sequence { value } => self.sequence = self.sequence.max(value),
            RegistryChange::Upserted { record } => {
                if let Some(seq) = vendor_sequence(&record.vendor_id) {
                    self.sequence = self.sequence.max(seq);
                }
                match self.position(&record.vendor_id) {
                    Some(index) => self.records[index] = record,
                    None => self.records.push(record),
                }
            }
            RegistryChange::Deleted { vendor_id } => {
                self.records.retain(|r| r.vendor_id != vendor_id);
            }
        }
    }

    fn position(&self, vendor_id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.vendor_id == vendor_id)
    }

    fn email_taken(&self, email: &str, except: Option<&str>) -> bool {
        let email = email.trim();
        self.records.iter().any(|r| {
            Some(r.vendor_id.as_str()) != except
                && r.draft.email.trim().eq_ignore_ascii_case(email)
        })
    }

    fn compacted(&self) -> Vec<RegistryEvent> {
        let mut events = vec![RegistryEvent::new(RegistryChange::Sequence {
            value: self.sequence,
        })];
        events.extend(self.records.iter().map(|record| {
            RegistryEvent::new(RegistryChange::Upserted {
                record: record.clone(),
            })
        }));
        events
    }
}

/// Vendor registry held in memory.  With a journal every mutation is made
/// durable before it becomes visible.
#[derive(Debug, Default)]
pub struct LocalVendorStore {
    state: Mutex<RegistryState>,
    journal: Option<RegistryJournal>,
}

impl LocalVendorStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or create) the journal at `path`, replay it and compact it.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let journal = RegistryJournal::open(path)?;
        let events = journal.load()?;
        let replayed = events.len();

        let mut state = RegistryState::default();
        for event in events {
            state.apply(event.change);
        }

        journal.overwrite(&state.compacted()).await?;
        info!(
            path = %journal.path().display(),
            vendors = state.records.len(),
            replayed,
            "vendor registry opened"
        );

        Ok(Self {
            state: Mutex::new(state),
            journal: Some(journal),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.journal.as_ref().map(RegistryJournal::path)
    }

    /// Make `change` durable, then apply it.
    async fn commit(
        &self,
        state: &mut RegistryState,
        change: RegistryChange,
    ) -> Result<(), StoreError> {
        if let Some(journal) = &self.journal {
            journal
                .append(&RegistryEvent::new(change.clone()))
                .await
                .map_err(|err| {
                    StoreError::Transport(format!("could not write vendor registry: {err}"))
                })?;
        }
        state.apply(change);
        Ok(())
    }
}

#[async_trait]
impl VendorStore for LocalVendorStore {
    async fn list(&self) -> Result<VendorListing, StoreError> {
        let state = self.state.lock().await;
        let mut vendors = state.records.clone();
        sort_records(&mut vendors, SortKey::VendorId, SortOrder::Ascending);
        Ok(VendorListing::from_vendors(vendors))
    }

    async fn get(&self, vendor_id: &str) -> Result<VendorRecord, StoreError> {
        let state = self.state.lock().await;
        state
            .position(vendor_id)
            .map(|index| state.records[index].clone())
            .ok_or_else(|| StoreError::NotFound(vendor_id.to_string()))
    }

    async fn create(&self, draft: &VendorDraft) -> Result<VendorRecord, StoreError> {
        let mut state = self.state.lock().await;
        if state.email_taken(&draft.email, None) {
            return Err(StoreError::Rejected(DUPLICATE_EMAIL.to_string()));
        }

        let record = VendorRecord::new(
            Uuid::new_v4().to_string(),
            format_vendor_id(state.sequence + 1),
            draft.clone(),
            Utc::now(),
        );
        self.commit(
            &mut state,
            RegistryChange::Upserted {
                record: record.clone(),
            },
        )
        .await?;

        debug!(vendor_id = %record.vendor_id, "vendor created");
        Ok(record)
    }

    async fn update(
        &self,
        vendor_id: &str,
        draft: &VendorDraft,
    ) -> Result<VendorRecord, StoreError> {
        let mut state = self.state.lock().await;
        let index = state
            .position(vendor_id)
            .ok_or_else(|| StoreError::NotFound(vendor_id.to_string()))?;
        if state.email_taken(&draft.email, Some(vendor_id)) {
            return Err(StoreError::Rejected(DUPLICATE_EMAIL.to_string()));
        }

        let mut record = state.records[index].clone();
        record.apply_update(draft.clone(), Utc::now());
        self.commit(
            &mut state,
            RegistryChange::Upserted {
                record: record.clone(),
            },
        )
        .await?;

        debug!(%vendor_id, "vendor updated");
        Ok(record)
    }

    async fn delete(&self, vendor_id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.position(vendor_id).is_none() {
            return Err(StoreError::NotFound(vendor_id.to_string()));
        }

        self.commit(
            &mut state,
            RegistryChange::Deleted {
                vendor_id: vendor_id.to_string(),
            },
        )
        .await?;

        debug!(%vendor_id, "vendor deleted");
        Ok(())
    }

    async fn next_identifier(&self) -> Result<String, StoreError> {
        let state = self.state.lock().await;
        Ok(format_vendor_id(state.sequence + 1))
    }

    async fn export_csv(&self, filter: &VendorFilter) -> Result<Vec<u8>, StoreError> {
        let listing = self.list().await?;
        Ok(to_csv(filter.apply(&listing.vendors)).into_bytes())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use vendor_onboarding::{Field, VendorStatus};

    fn draft(company: &str, email: &str) -> VendorDraft {
        VendorDraft::default()
            .with_field(Field::CompanyName, company)
            .with_field(Field::Email, email)
            .with_field(Field::Country, "India")
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = LocalVendorStore::in_memory();
        assert_eq!(store.next_identifier().await.unwrap(), "VENDOR001");
        assert_eq!(store.next_identifier().await.unwrap(), "VENDOR001");

        let first = store.create(&draft("A", "a@x.com")).await.unwrap();
        let second = store.create(&draft("B", "b@x.com")).await.unwrap();
        assert_eq!(first.vendor_id, "VENDOR001");
        assert_eq!(second.vendor_id, "VENDOR002");
        assert_eq!(first.status, VendorStatus::Active);
        assert_ne!(first.id, second.id);
        assert_eq!(store.next_identifier().await.unwrap(), "VENDOR003");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = LocalVendorStore::in_memory();
        store.create(&draft("A", "sales@acme.com")).await.unwrap();

        let err = store.create(&draft("B", " SALES@acme.com ")).await.unwrap_err();
        assert_eq!(err, StoreError::Rejected(DUPLICATE_EMAIL.to_string()));
        assert_eq!(store.list().await.unwrap().vendors.len(), 1);
    }

    #[tokio::test]
    async fn update_keeps_identity_and_checks_email() {
        let store = LocalVendorStore::in_memory();
        let a = store.create(&draft("A", "a@x.com")).await.unwrap();
        store.create(&draft("B", "b@x.com")).await.unwrap();

        let updated = store
            .update(&a.vendor_id, &draft("A Renamed", "a@x.com"))
            .await
            .unwrap();
        assert_eq!(updated.id, a.id);
        assert_eq!(updated.created_at, a.created_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.draft.company_name, "A Renamed");

        let err = store
            .update(&a.vendor_id, &draft("A", "b@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Rejected(DUPLICATE_EMAIL.to_string()));

        let err = store
            .update("VENDOR999", &draft("Z", "z@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("VENDOR999".to_string()));
    }

    #[tokio::test]
    async fn delete_removes_but_does_not_reuse_ids() {
        let store = LocalVendorStore::in_memory();
        store.create(&draft("A", "a@x.com")).await.unwrap();
        store.create(&draft("B", "b@x.com")).await.unwrap();

        store.delete("VENDOR002").await.unwrap();
        assert_eq!(
            store.get("VENDOR002").await.unwrap_err(),
            StoreError::NotFound("VENDOR002".to_string())
        );
        assert_eq!(
            store.delete("VENDOR002").await.unwrap_err(),
            StoreError::NotFound("VENDOR002".to_string())
        );

        let c = store.create(&draft("C", "c@x.com")).await.unwrap();
        assert_eq!(c.vendor_id, "VENDOR003");
    }

    #[tokio::test]
    async fn journal_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vendors.jsonl");

        {
            let store = LocalVendorStore::open(&path).await.unwrap();
            assert_eq!(store.path(), Some(path.as_path()));
            store.create(&draft("A", "a@x.com")).await.unwrap();
            store.create(&draft("B", "b@x.com")).await.unwrap();
            store.update("VENDOR001", &draft("A2", "a@x.com")).await.unwrap();
            store.delete("VENDOR002").await.unwrap();
        }

        let store = LocalVendorStore::open(&path).await.unwrap();
        let listing = store.list().await.unwrap();
        assert_eq!(listing.vendors.len(), 1);
        assert_eq!(listing.vendors[0].draft.company_name, "A2");
        assert_eq!(store.next_identifier().await.unwrap(), "VENDOR003");

        // compaction leaves a sequence marker plus one line per vendor
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }

    #[tokio::test]
    async fn export_applies_filter() {
        let store = LocalVendorStore::in_memory();
        store.create(&draft("Bharat Steel", "a@x.com")).await.unwrap();
        store
            .create(&draft("Acme", "b@x.com").with_field(Field::Country, "Germany"))
            .await
            .unwrap();

        let filter = VendorFilter {
            country: Some("germany".to_string()),
            ..VendorFilter::default()
        };
        let csv = String::from_utf8(store.export_csv(&filter).await.unwrap()).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].starts_with("VENDOR002,Acme,"));
    }
}
