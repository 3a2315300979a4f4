//! API key record model shared by the store and its consumers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{Result, StoreError};

/// Availability of a stored key, toggled manually by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum KeyStatus {
    #[default]
    Available,
    Unavailable,
}

/// Display color for a key, from a fixed 8-value palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum KeyColor {
    Green,
    #[default]
    Blue,
    Red,
    Purple,
    Orange,
    Yellow,
    Pink,
    Gray,
}

impl KeyColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Pink => "pink",
            Self::Gray => "gray",
        }
    }

    /// Parse a palette name. Empty or unrecognized names fall back to blue.
    pub fn from_name(name: &str) -> Self {
        match name {
            "green" => Self::Green,
            "blue" => Self::Blue,
            "red" => Self::Red,
            "purple" => Self::Purple,
            "orange" => Self::Orange,
            "yellow" => Self::Yellow,
            "pink" => Self::Pink,
            "gray" => Self::Gray,
            _ => Self::Blue,
        }
    }
}

/// A stored API key record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ApiKey {
    #[ts(type = "number")]
    pub id: u64,
    pub nickname: String,
    pub key_value: String,
    pub platform: String,
    pub domain: String,
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default)]
    pub color: KeyColor,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub status: KeyStatus,
    #[ts(type = "number")]
    pub created_at: i64,
    #[ts(type = "number")]
    pub updated_at: i64,
}

impl ApiKey {
    pub(crate) fn from_draft(id: u64, draft: ApiKeyDraft, status: KeyStatus, now: i64) -> Self {
        Self {
            id,
            nickname: draft.nickname,
            key_value: draft.key_value,
            platform: draft.platform,
            domain: draft.domain,
            api_base_url: draft.api_base_url,
            color: draft.color,
            tags: dedup_tags(draft.tags),
            note: draft.note,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial patch into this record and refresh `updated_at`.
    /// `id` and `created_at` are untouched.
    pub(crate) fn apply(&mut self, patch: ApiKeyPatch, now: i64) {
        if let Some(nickname) = patch.nickname {
            self.nickname = nickname;
        }
        if let Some(key_value) = patch.key_value {
            self.key_value = key_value;
        }
        if let Some(platform) = patch.platform {
            self.platform = platform;
        }
        if let Some(domain) = patch.domain {
            self.domain = domain;
        }
        if let Some(api_base_url) = patch.api_base_url {
            self.api_base_url = api_base_url;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(tags) = patch.tags {
            self.tags = dedup_tags(tags);
        }
        if let Some(note) = patch.note {
            self.note = note;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
    }

    /// Case-insensitive substring match against the searchable fields.
    /// The secret value itself is never searched.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.nickname.to_lowercase().contains(needle)
            || self.platform.to_lowercase().contains(needle)
            || self.domain.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
            || self
                .note
                .as_ref()
                .is_some_and(|note| note.to_lowercase().contains(needle))
    }
}

/// Creation payload: the record fields minus `id`, `status` and timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ApiKeyDraft {
    pub nickname: String,
    pub key_value: String,
    pub platform: String,
    pub domain: String,
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default)]
    pub color: KeyColor,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ApiKeyDraft {
    pub fn new(
        nickname: impl Into<String>,
        key_value: impl Into<String>,
        platform: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            nickname: nickname.into(),
            key_value: key_value.into(),
            platform: platform.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Add a tag, skipping empty strings and exact duplicates.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !tag.trim().is_empty() && !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Form-boundary check: the four required fields must be non-empty
    /// after trimming. The store itself does not re-validate.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("nickname", &self.nickname),
            ("key_value", &self.key_value),
            ("platform", &self.platform),
            ("domain", &self.domain),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::Validation(format!(
                    "missing required field: {name}"
                )));
            }
        }
        Ok(())
    }
}

/// Partial update: `None` leaves a field unchanged. The two nullable
/// fields use a nested `Option` so `Some(None)` clears them.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyPatch {
    pub nickname: Option<String>,
    pub key_value: Option<String>,
    pub platform: Option<String>,
    pub domain: Option<String>,
    pub api_base_url: Option<String>,
    pub color: Option<KeyColor>,
    pub tags: Option<Vec<String>>,
    pub note: Option<Option<String>>,
    pub status: Option<KeyStatus>,
}

/// One entry of a snapshot import: the draft plus its carried status.
#[derive(Debug, Clone)]
pub struct ImportEntry {
    pub draft: ApiKeyDraft,
    pub status: KeyStatus,
}

/// Drop duplicate tags, keeping first occurrence order. Exact match,
/// case-sensitive.
pub(crate) fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut deduped: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !tag.is_empty() && !deduped.contains(&tag) {
            deduped.push(tag);
        }
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_validation_rejects_empty_required_fields() {
        let draft = ApiKeyDraft::new("prod", "sk-123", "OpenAI", "api.openai.com");
        assert!(draft.validate().is_ok());

        let draft = ApiKeyDraft::new("prod", "  ", "OpenAI", "api.openai.com");
        let err = draft.validate().unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(err.to_string().contains("key_value"));
    }

    #[test]
    fn with_tag_skips_duplicates_and_blanks() {
        let draft = ApiKeyDraft::new("prod", "sk-123", "OpenAI", "api.openai.com")
            .with_tag("llm")
            .with_tag("llm")
            .with_tag("  ")
            .with_tag("prod");

        assert_eq!(draft.tags, vec!["llm", "prod"]);
    }

    #[test]
    fn patch_merges_only_provided_fields() {
        let draft = ApiKeyDraft::new("prod", "sk-123", "OpenAI", "api.openai.com");
        let mut record = ApiKey::from_draft(1, draft, KeyStatus::Available, 1_000);
        record.note = Some("primary key".to_string());

        let patch = ApiKeyPatch {
            nickname: Some("production".to_string()),
            tags: Some(vec!["a".to_string(), "a".to_string(), "b".to_string()]),
            ..ApiKeyPatch::default()
        };
        record.apply(patch, 2_000);

        assert_eq!(record.nickname, "production");
        assert_eq!(record.key_value, "sk-123");
        assert_eq!(record.note, Some("primary key".to_string()));
        assert_eq!(record.tags, vec!["a", "b"]);
        assert_eq!(record.created_at, 1_000);
        assert_eq!(record.updated_at, 2_000);
    }

    #[test]
    fn patch_clears_note_with_nested_none() {
        let draft = ApiKeyDraft::new("prod", "sk-123", "OpenAI", "api.openai.com");
        let mut record = ApiKey::from_draft(1, draft, KeyStatus::Available, 1_000);
        record.note = Some("scratch".to_string());

        let patch = ApiKeyPatch {
            note: Some(None),
            ..ApiKeyPatch::default()
        };
        record.apply(patch, 2_000);

        assert_eq!(record.note, None);
    }

    #[test]
    fn color_name_round_trip_with_fallback() {
        assert_eq!(KeyColor::from_name("pink"), KeyColor::Pink);
        assert_eq!(KeyColor::from_name("pink").as_str(), "pink");
        assert_eq!(KeyColor::from_name(""), KeyColor::Blue);
        assert_eq!(KeyColor::from_name("magenta"), KeyColor::Blue);
    }

    #[test]
    fn secret_value_is_not_searchable() {
        let draft = ApiKeyDraft::new("prod", "sk-secret", "OpenAI", "api.openai.com");
        let record = ApiKey::from_draft(1, draft, KeyStatus::Available, 1_000);

        assert!(record.matches("openai"));
        assert!(!record.matches("sk-secret"));
    }
}
