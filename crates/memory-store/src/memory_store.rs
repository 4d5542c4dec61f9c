use std::path::{Path, PathBuf};

use async_trait::async_trait;
use memory_types::{Memory, MemoryError};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::warn;

use crate::cosine::cosine_distance;
use crate::VectorStore;

/// A boxed row predicate, used by `list`/`delete_where`/`search` to express
/// the caller's pre-filter (e.g. "live rows only", "excluding this id").
pub type RowFilter = dyn Fn(&Memory) -> bool + Send + Sync;

/// In-memory reference `VectorStore`. Optionally persists to a single JSONL
/// snapshot file, rewritten atomically (tmp + fsync + rename) after every
/// mutation, the way the teacher's event log persists its state.
pub struct InMemoryVectorStore {
    rows: RwLock<Vec<Memory>>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryVectorStore {
    /// Empty store, no persistence.
    pub fn in_memory() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            snapshot_path: None,
        }
    }

    /// Opens (and, if present, loads) a JSONL snapshot at `path`. Lines that
    /// fail to parse are quarantined to `<path>.corrupt` rather than
    /// aborting the load, the same tolerance the teacher's event log applies
    /// to its own JSONL replay.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        let path = path.into();
        let rows = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => load_rows(&path, &contents).await,
            Err(_) => Vec::new(),
        };
        Ok(Self {
            rows: RwLock::new(rows),
            snapshot_path: Some(path),
        })
    }

    async fn persist(&self, rows: &[Memory]) -> Result<(), MemoryError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        overwrite_snapshot(path, rows)
            .await
            .map_err(|e| MemoryError::Store(e.to_string()))
    }
}

async fn load_rows(path: &Path, contents: &str) -> Vec<Memory> {
    let mut rows = Vec::new();
    let mut corrupt = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Memory>(line) {
            Ok(row) => rows.push(row),
            Err(_) => corrupt.push(line.to_string()),
        }
    }
    if !corrupt.is_empty() {
        warn!(count = corrupt.len(), path = %path.display(), "quarantining corrupt snapshot lines");
        let sidecar = format!("{}.corrupt", path.display());
        let _ = tokio::fs::write(sidecar, corrupt.join("\n")).await;
    }
    rows
}

async fn overwrite_snapshot(path: &Path, rows: &[Memory]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path).await?;
    for row in rows {
        let line = serde_json::to_string(row)?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn append(&self, row: Memory) -> Result<(), MemoryError> {
        let snapshot = {
            let mut rows = self.rows.write().await;
            rows.push(row);
            rows.clone()
        };
        self.persist(&snapshot).await
    }

    async fn update(&self, row: Memory) -> Result<(), MemoryError> {
        let snapshot = {
            let mut rows = self.rows.write().await;
            let existing = rows.iter_mut().find(|r| r.id == row.id);
            match existing {
                Some(slot) => *slot = row,
                None => return Err(MemoryError::Store(format!("no row with id {}", row.id))),
            }
            rows.clone()
        };
        self.persist(&snapshot).await
    }

    async fn get(&self, id: &str) -> Result<Option<Memory>, MemoryError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, user_id: &str, filter: &RowFilter) -> Result<Vec<Memory>, MemoryError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| r.user_id == user_id && filter(r))
            .cloned()
            .collect())
    }

    async fn delete_where(&self, user_id: &str, filter: &RowFilter) -> Result<Vec<Memory>, MemoryError> {
        let (deleted, snapshot) = {
            let mut rows = self.rows.write().await;
            let mut deleted = Vec::new();
            rows.retain(|r| {
                if r.user_id == user_id && filter(r) {
                    deleted.push(r.clone());
                    false
                } else {
                    true
                }
            });
            (deleted, rows.clone())
        };
        self.persist(&snapshot).await?;
        Ok(deleted)
    }

    async fn search(
        &self,
        user_id: &str,
        vector: &[f32],
        limit: usize,
        filter: &RowFilter,
    ) -> Result<Vec<(Memory, f32)>, MemoryError> {
        let rows = self.rows.read().await;
        let mut scored: Vec<(Memory, f32)> = rows
            .iter()
            .filter(|r| r.user_id == user_id && filter(r))
            .map(|r| (r.clone(), cosine_distance(vector, &r.vector)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}
