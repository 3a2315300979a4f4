//! Versioned JSON snapshot for import/export.
//!
//! The document shape is 1:1 with the persisted record minus `id` and
//! timestamps, which the import path regenerates. Older documents may
//! omit `platform` (back-filled from `domain`) and `color` (defaults to
//! blue).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{Result, StoreError};
use crate::record::{dedup_tags, ApiKey, ApiKeyDraft, ImportEntry, KeyColor, KeyStatus};

pub const SNAPSHOT_VERSION: &str = "3.0";

/// One exported key entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SnapshotKey {
    pub nickname: String,
    pub key_value: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub api_base_url: String,
    /// Raw palette name; unrecognized values fall back to blue on import.
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub status: KeyStatus,
}

impl SnapshotKey {
    fn from_record(record: &ApiKey) -> Self {
        Self {
            nickname: record.nickname.clone(),
            key_value: record.key_value.clone(),
            platform: record.platform.clone(),
            domain: record.domain.clone(),
            api_base_url: record.api_base_url.clone(),
            color: record.color.as_str().to_string(),
            tags: record.tags.clone(),
            note: record.note.clone(),
            status: record.status,
        }
    }

    fn into_entry(self) -> ImportEntry {
        let platform = if self.platform.is_empty() {
            self.domain.clone()
        } else {
            self.platform
        };

        ImportEntry {
            draft: ApiKeyDraft {
                nickname: self.nickname,
                key_value: self.key_value,
                platform,
                domain: self.domain,
                api_base_url: self.api_base_url,
                color: KeyColor::from_name(&self.color),
                tags: dedup_tags(self.tags),
                note: self.note,
            },
            status: self.status,
        }
    }
}

/// The full snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExportDocument {
    pub version: String,
    #[serde(default)]
    pub export_date: String,
    pub keys: Vec<SnapshotKey>,
}

impl ExportDocument {
    /// Build a snapshot of the given records, stamped with the current
    /// time.
    pub fn from_records(records: &[ApiKey]) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            export_date: chrono::Utc::now().to_rfc3339(),
            keys: records.iter().map(SnapshotKey::from_record).collect(),
        }
    }

    /// Parse and validate a snapshot document. Structural problems
    /// (missing `version`, `keys` not an array) and entries missing a
    /// required field both reject the whole document.
    pub fn parse(input: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(input)
            .map_err(|err| StoreError::Format(err.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    /// Per-entry validation: `nickname`, `key_value` and `domain` must be
    /// non-empty.
    pub fn validate(&self) -> Result<()> {
        for (index, key) in self.keys.iter().enumerate() {
            if key.nickname.is_empty() || key.key_value.is_empty() || key.domain.is_empty() {
                return Err(StoreError::Format(format!(
                    "entry {index} is missing a required field"
                )));
            }
        }
        Ok(())
    }

    /// Convert validated entries into import payloads, applying the
    /// back-compat fills.
    pub fn into_entries(self) -> Vec<ImportEntry> {
        self.keys.into_iter().map(SnapshotKey::into_entry).collect()
    }

    /// Serialize for download, pretty-printed.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(nickname: &str) -> ApiKey {
        ApiKey {
            id: 1,
            nickname: nickname.to_string(),
            key_value: "sk-test123".to_string(),
            platform: "OpenAI".to_string(),
            domain: "api.openai.com".to_string(),
            api_base_url: String::new(),
            color: KeyColor::Green,
            tags: vec!["llm".to_string()],
            note: None,
            status: KeyStatus::Available,
            created_at: 1_000,
            updated_at: 1_000,
        }
    }

    #[test]
    fn export_document_carries_version_and_entries() {
        let document = ExportDocument::from_records(&[record("prod")]);

        assert_eq!(document.version, SNAPSHOT_VERSION);
        assert_eq!(document.keys.len(), 1);
        assert_eq!(document.keys[0].color, "green");
        assert_eq!(document.keys[0].status, KeyStatus::Available);
    }

    #[test]
    fn parse_rejects_documents_without_version_or_keys() {
        let err = ExportDocument::parse(r#"{"keys": []}"#).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));

        let err = ExportDocument::parse(r#"{"version": "3.0"}"#).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));

        let err =
            ExportDocument::parse(r#"{"version": "3.0", "export_date": "x", "keys": 5}"#)
                .unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }

    #[test]
    fn parse_rejects_entries_missing_required_fields() {
        let input = r#"{
            "version": "3.0",
            "export_date": "2024-01-01T00:00:00Z",
            "keys": [
                {"nickname": "prod", "key_value": "sk-1", "domain": "api.openai.com"},
                {"nickname": "", "key_value": "sk-2", "domain": "api.openai.com"}
            ]
        }"#;

        let err = ExportDocument::parse(input).unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn older_entries_are_backfilled_on_import() {
        let input = r#"{
            "version": "2.0",
            "export_date": "2023-01-01T00:00:00Z",
            "keys": [
                {"nickname": "prod", "key_value": "sk-1", "domain": "api.openai.com"}
            ]
        }"#;

        let entries = ExportDocument::parse(input).unwrap().into_entries();
        assert_eq!(entries.len(), 1);
        // platform falls back to the entry's domain, color to blue.
        assert_eq!(entries[0].draft.platform, "api.openai.com");
        assert_eq!(entries[0].draft.color, KeyColor::Blue);
        assert_eq!(entries[0].status, KeyStatus::Available);
    }

    #[test]
    fn document_round_trips_through_json() {
        let document = ExportDocument::from_records(&[record("prod")]);
        let json = document.to_json().unwrap();
        let parsed = ExportDocument::parse(&json).unwrap();

        assert_eq!(parsed.version, document.version);
        let entries = parsed.into_entries();
        assert_eq!(entries[0].draft.nickname, "prod");
        assert_eq!(entries[0].draft.key_value, "sk-test123");
        assert_eq!(entries[0].draft.color, KeyColor::Green);
        assert_eq!(entries[0].draft.tags, vec!["llm"]);
    }
}
