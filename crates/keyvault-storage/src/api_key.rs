//! API key storage - the record collection and its lookups.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ts_rs::TS;

use crate::error::{Result, StoreError};
use crate::events::{ChangeBus, ChangeEvent};
use crate::record::{ApiKey, ApiKeyDraft, ApiKeyPatch, ImportEntry, KeyStatus};
use crate::snapshot::ExportDocument;
use crate::time_utils::now_ms;

const API_KEYS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("api_keys");
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("api_keys:meta");

/// Meta-table key for the id counter. The counter only ever moves
/// forward, so ids are never reused, even across an import.
const NEXT_ID_KEY: &str = "next_id";

/// Aggregate counts for the stats view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KeyStats {
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
}

/// API key storage
#[derive(Debug, Clone)]
pub struct ApiKeyStorage {
    db: Arc<Database>,
    bus: ChangeBus,
}

impl ApiKeyStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(API_KEYS_TABLE)?;
        write_txn.open_table(META_TABLE)?;
        write_txn.commit()?;

        Ok(Self {
            db,
            bus: ChangeBus::new(),
        })
    }

    /// Subscribe to mutation events on this collection.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ChangeEvent> {
        self.bus.subscribe()
    }

    /// Create a new record from a draft. Assigns a fresh id, stamps both
    /// timestamps with the same instant and sets the status to available.
    ///
    /// Required-field validation belongs to the form boundary
    /// ([`ApiKeyDraft::validate`]); it is not repeated here.
    pub fn create(&self, draft: ApiKeyDraft) -> Result<ApiKey> {
        let now = now_ms();
        let record = {
            let write_txn = self.db.begin_write()?;
            let record = {
                let mut meta = write_txn.open_table(META_TABLE)?;
                let id = Self::allocate_id(&mut meta)?;
                drop(meta);

                let record = ApiKey::from_draft(id, draft, KeyStatus::Available, now);
                let mut table = write_txn.open_table(API_KEYS_TABLE)?;
                let serialized = serde_json::to_vec(&record)?;
                table.insert(id, serialized.as_slice())?;
                record
            };
            write_txn.commit()?;
            record
        };

        self.bus.publish(ChangeEvent::Created { id: record.id });
        Ok(record)
    }

    /// Merge a partial patch into an existing record and refresh
    /// `updated_at`. Fails with [`StoreError::NotFound`] for an unknown id.
    pub fn update(&self, id: u64, patch: ApiKeyPatch) -> Result<ApiKey> {
        let now = now_ms();
        let record = {
            let write_txn = self.db.begin_write()?;
            let record = {
                let mut table = write_txn.open_table(API_KEYS_TABLE)?;
                let mut record: ApiKey = match table.get(id)? {
                    Some(data) => serde_json::from_slice(data.value())?,
                    None => return Err(StoreError::NotFound(id)),
                };

                record.apply(patch, now);
                let serialized = serde_json::to_vec(&record)?;
                table.insert(id, serialized.as_slice())?;
                record
            };
            write_txn.commit()?;
            record
        };

        self.bus.publish(ChangeEvent::Updated { id });
        Ok(record)
    }

    /// Every record, newest first, with available keys ordered before
    /// unavailable ones.
    pub fn get_all(&self) -> Result<Vec<ApiKey>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(API_KEYS_TABLE)?;

        let mut records = Vec::new();
        for row in table.iter()? {
            let (_, value) = row?;
            records.push(serde_json::from_slice::<ApiKey>(value.value())?);
        }
        Ok(sort_for_listing(records))
    }

    pub fn get_by_id(&self, id: u64) -> Result<Option<ApiKey>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(API_KEYS_TABLE)?;

        match table.get(id)? {
            Some(data) => Ok(Some(serde_json::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Remove a record permanently. Deleting an unknown id is a no-op,
    /// unlike [`Self::update`] which signals not-found.
    pub fn delete(&self, id: u64) -> Result<()> {
        let removed = {
            let write_txn = self.db.begin_write()?;
            let removed = {
                let mut table = write_txn.open_table(API_KEYS_TABLE)?;
                table.remove(id)?.is_some()
            };
            write_txn.commit()?;
            removed
        };

        if removed {
            self.bus.publish(ChangeEvent::Deleted { id });
        }
        Ok(())
    }

    /// Case-insensitive substring search over nickname, platform, domain,
    /// tags and note. Same ordering contract as [`Self::get_all`]; callers
    /// route empty queries to `get_all` instead.
    pub fn search(&self, query: &str) -> Result<Vec<ApiKey>> {
        let needle = query.to_lowercase();
        let records = self.get_all()?;
        Ok(records
            .into_iter()
            .filter(|record| record.matches(&needle))
            .collect())
    }

    /// Wipe the collection and insert the given entries in one write
    /// transaction. All entries share one timestamp captured at the start;
    /// a failure leaves the previous collection intact.
    pub fn import_replace(&self, entries: Vec<ImportEntry>) -> Result<Vec<ApiKey>> {
        let now = now_ms();
        let records = {
            let write_txn = self.db.begin_write()?;
            let records = {
                let mut meta = write_txn.open_table(META_TABLE)?;
                let mut table = write_txn.open_table(API_KEYS_TABLE)?;
                table.retain(|_, _| false)?;

                let mut records = Vec::with_capacity(entries.len());
                for entry in entries {
                    let id = Self::allocate_id(&mut meta)?;
                    let record = ApiKey::from_draft(id, entry.draft, entry.status, now);
                    let serialized = serde_json::to_vec(&record)?;
                    table.insert(id, serialized.as_slice())?;
                    records.push(record);
                }
                records
            };
            write_txn.commit()?;
            records
        };

        tracing::info!("Replaced key collection with {} imported records", records.len());
        self.bus.publish(ChangeEvent::Replaced);
        Ok(records)
    }

    /// Snapshot source; same view as [`Self::get_all`].
    pub fn export_all(&self) -> Result<Vec<ApiKey>> {
        self.get_all()
    }

    /// Build a versioned snapshot document of the current collection.
    pub fn export_snapshot(&self) -> Result<ExportDocument> {
        Ok(ExportDocument::from_records(&self.export_all()?))
    }

    /// Validate a snapshot document and replace the collection with it.
    pub fn import_snapshot(&self, document: ExportDocument) -> Result<Vec<ApiKey>> {
        document.validate()?;
        self.import_replace(document.into_entries())
    }

    /// Distinct tags across all records, sorted ascending.
    pub fn list_tags(&self) -> Result<Vec<String>> {
        let mut tags: Vec<String> = self
            .get_all()?
            .into_iter()
            .flat_map(|record| record.tags)
            .filter(|tag| !tag.is_empty())
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    /// Distinct platform names, sorted ascending.
    pub fn list_platforms(&self) -> Result<Vec<String>> {
        self.list_field(|record| record.platform)
    }

    /// Distinct domain names, sorted ascending.
    pub fn list_domains(&self) -> Result<Vec<String>> {
        self.list_field(|record| record.domain)
    }

    /// Aggregate availability counts.
    pub fn stats(&self) -> Result<KeyStats> {
        let records = self.get_all()?;
        let available = records
            .iter()
            .filter(|record| record.status == KeyStatus::Available)
            .count();
        Ok(KeyStats {
            total: records.len(),
            available,
            unavailable: records.len() - available,
        })
    }

    fn list_field(&self, field: fn(ApiKey) -> String) -> Result<Vec<String>> {
        let mut values: Vec<String> = self
            .get_all()?
            .into_iter()
            .map(field)
            .filter(|value| !value.is_empty())
            .collect();
        values.sort();
        values.dedup();
        Ok(values)
    }

    fn allocate_id(meta: &mut redb::Table<'_, &'static str, u64>) -> Result<u64> {
        let next = meta.get(NEXT_ID_KEY)?.map(|v| v.value()).unwrap_or(1);
        meta.insert(NEXT_ID_KEY, next + 1)?;
        Ok(next)
    }
}

/// Ordering contract for listings: newest first, then a stable pass that
/// floats available keys above unavailable ones.
fn sort_for_listing(mut records: Vec<ApiKey>) -> Vec<ApiKey> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records.sort_by_key(|record| record.status != KeyStatus::Available);
    records
}
