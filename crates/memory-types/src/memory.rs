use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::taxonomy::MemoryType;

/// Free-form caller/extractor metadata, with two well-known optional keys
/// (`date`, `condensed_from`) promoted to typed helpers. The `type` key is
/// kept in sync with `Memory::fact_type` but the rest of the object is left
/// unconstrained, per design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata(pub Map<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session date: `metadata.date` if present, else falls back to the
    /// first 10 characters of `created_at` at the call site. `None` when
    /// `date` is present but fails to parse as `%Y-%m-%d` — distinct from
    /// the key being absent, which is what `session_date` falls back on.
    pub fn date(&self) -> Option<NaiveDate> {
        self.0
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    /// Whether a `date` key is present at all, regardless of whether its
    /// value parses as a date.
    pub fn has_date_key(&self) -> bool {
        self.0.get("date").is_some()
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.0
            .insert("date".to_string(), Value::String(date.format("%Y-%m-%d").to_string()));
    }

    pub fn condensed_from(&self) -> Option<&str> {
        self.0.get("condensed_from").and_then(Value::as_str)
    }

    pub fn set_condensed_from(&mut self, id: &str) {
        self.0
            .insert("condensed_from".to_string(), Value::String(id.to_string()));
    }

    pub fn set_type(&mut self, ty: MemoryType) {
        self.0
            .insert("type".to_string(), Value::String(ty.as_str().to_string()));
    }
}

/// A single row in the `memories` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub user_id: String,
    pub memory: String,
    pub fact_type: MemoryType,
    pub vector: Vec<f32>,
    pub chunk: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub hash: String,
    /// Empty string means "live"; otherwise the id of the row that retired
    /// this one.
    pub superseded_by: String,
}

impl Memory {
    /// Builds a freshly-inserted row: fresh uuid, `created_at == updated_at`,
    /// live (`superseded_by == ""`).
    pub fn new_inserted(
        user_id: impl Into<String>,
        memory: impl Into<String>,
        fact_type: MemoryType,
        vector: Vec<f32>,
        chunk: impl Into<String>,
        mut metadata: Metadata,
    ) -> Self {
        let memory = memory.into();
        let now = Utc::now();
        metadata.set_type(fact_type);
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            hash: hash_text(&memory),
            memory,
            fact_type,
            vector,
            chunk: chunk.into(),
            metadata,
            created_at: now,
            updated_at: now,
            superseded_by: String::new(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.superseded_by.is_empty()
    }

    /// In-place UPDATE as performed by the Deduper: overwrites text-derived
    /// fields and `updated_at`; keeps `id`, `user_id`, `vector`, `created_at`.
    pub fn apply_update(
        &mut self,
        memory: impl Into<String>,
        chunk: impl Into<String>,
        mut metadata: Metadata,
    ) {
        let memory = memory.into();
        metadata.set_type(self.fact_type);
        self.hash = hash_text(&memory);
        self.memory = memory;
        self.chunk = chunk.into();
        self.metadata = metadata;
        self.updated_at = Utc::now();
    }

    /// Retirement by the Versioner: idempotent, last-writer-wins.
    pub fn retire(&mut self, successor_id: &str) {
        self.superseded_by = successor_id.to_string();
        self.updated_at = Utc::now();
    }

    /// Session date used by the ranker's recency blend: `metadata.date` if
    /// present, else the date portion of `created_at`. A `date` key that is
    /// present but fails to parse yields `None` rather than falling back to
    /// `created_at` — the ranker scores that row's recency as 0.
    pub fn session_date(&self) -> Option<NaiveDate> {
        if self.metadata.has_date_key() {
            self.metadata.date()
        } else {
            Some(self.created_at.date_naive())
        }
    }
}

pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_inserted_sets_created_eq_updated_and_live() {
        let m = Memory::new_inserted(
            "u1",
            "Use bun not npm",
            MemoryType::Preference,
            vec![0.0; 4],
            "chunk text",
            Metadata::new(),
        );
        assert_eq!(m.created_at, m.updated_at);
        assert!(m.is_live());
        assert_eq!(m.metadata.0.get("type").and_then(Value::as_str), Some("preference"));
    }

    #[test]
    fn apply_update_keeps_id_and_vector_bumps_updated_at() {
        let mut m = Memory::new_inserted(
            "u1",
            "Use bun not npm",
            MemoryType::Preference,
            vec![1.0, 2.0],
            "chunk",
            Metadata::new(),
        );
        let original_id = m.id.clone();
        let original_vector = m.vector.clone();
        let original_created = m.created_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        m.apply_update("Always use bun, never npm", "new chunk", Metadata::new());
        assert_eq!(m.id, original_id);
        assert_eq!(m.vector, original_vector);
        assert_eq!(m.created_at, original_created);
        assert!(m.updated_at >= original_created);
        assert_eq!(m.memory, "Always use bun, never npm");
    }

    #[test]
    fn retire_is_idempotent_last_writer_wins() {
        let mut m = Memory::new_inserted("u1", "old fact", MemoryType::TechContext, vec![], "", Metadata::new());
        m.retire("successor-1");
        assert_eq!(m.superseded_by, "successor-1");
        m.retire("successor-2");
        assert_eq!(m.superseded_by, "successor-2");
        assert!(!m.is_live());
    }

    #[test]
    fn session_date_falls_back_to_created_at_when_date_key_absent() {
        let m = Memory::new_inserted("u1", "no date set", MemoryType::Preference, vec![], "chunk", Metadata::new());
        assert_eq!(m.session_date(), Some(m.created_at.date_naive()));
    }

    #[test]
    fn session_date_uses_metadata_date_when_present_and_valid() {
        let mut metadata = Metadata::new();
        let date = NaiveDate::parse_from_str("2026-01-01", "%Y-%m-%d").unwrap();
        metadata.set_date(date);
        let m = Memory::new_inserted("u1", "dated fact", MemoryType::Preference, vec![], "chunk", metadata);
        assert_eq!(m.session_date(), Some(date));
    }

    #[test]
    fn session_date_is_none_when_date_key_present_but_unparseable() {
        let mut metadata = Metadata::new();
        metadata.0.insert("date".to_string(), Value::String("not-a-date".to_string()));
        let m = Memory::new_inserted("u1", "malformed date fact", MemoryType::Preference, vec![], "chunk", metadata);
        assert_eq!(m.session_date(), None, "present-but-unparseable date must not fall back to created_at");
    }
}
