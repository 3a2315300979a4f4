//! KeyVault Storage - embedded persistence for API key records
//!
//! This crate provides the data-access core of KeyVault, using redb as the
//! embedded database. Records are stored as JSON values keyed by a
//! monotonically assigned integer id; everything a presentation layer needs
//! (listing order, search, distinct-value suggestions, stats, snapshot
//! import/export, change notification) lives behind [`ApiKeyStorage`].
//!
//! # Tables
//!
//! - `api_keys` - API key records keyed by id
//! - `api_keys:meta` - persistent id counter
//!
//! # Ordering contract
//!
//! Listings return the newest records first, with available keys ordered
//! before unavailable ones.

pub mod api_key;
pub mod error;
pub mod events;
pub mod paths;
pub mod record;
pub mod snapshot;

mod time_utils;

use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub use api_key::{ApiKeyStorage, KeyStats};
pub use error::{Result, StoreError};
pub use events::{ChangeBus, ChangeEvent};
pub use record::{ApiKey, ApiKeyDraft, ApiKeyPatch, ImportEntry, KeyColor, KeyStatus};
pub use snapshot::{ExportDocument, SnapshotKey, SNAPSHOT_VERSION};

/// Central storage manager that initializes the database and the record
/// collection.
pub struct Storage {
    db: Arc<Database>,
    pub api_keys: ApiKeyStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and
    /// initialize all required tables.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);
        let api_keys = ApiKeyStorage::new(db.clone())?;

        Ok(Self { db, api_keys })
    }

    /// Open the database at its default location
    /// (`$KEYVAULT_DIR` or `~/.keyvault/keyvault.redb`).
    pub fn open_default() -> Result<Self> {
        paths::ensure_keyvault_dir()?;
        Self::new(paths::database_path()?)
    }

    /// Subscribe to mutation events on the key collection.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ChangeEvent> {
        self.api_keys.subscribe()
    }

    /// Get a reference to the underlying database
    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn storage_initializes_and_persists_across_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("keyvault.redb");

        let created_id = {
            let storage = Storage::new(&db_path).unwrap();
            let record = storage
                .api_keys
                .create(ApiKeyDraft::new("prod", "sk-1", "OpenAI", "api.openai.com"))
                .unwrap();
            record.id
        };

        let storage = Storage::new(&db_path).unwrap();
        let fetched = storage.api_keys.get_by_id(created_id).unwrap().unwrap();
        assert_eq!(fetched.nickname, "prod");

        // The id counter is persistent too; new ids keep moving forward.
        let next = storage
            .api_keys
            .create(ApiKeyDraft::new("dev", "sk-2", "OpenAI", "api.openai.com"))
            .unwrap();
        assert!(next.id > created_id);
    }
}
