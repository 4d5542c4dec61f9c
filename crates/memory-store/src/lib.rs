//! The vector store boundary: the core never talks to a concrete vector
//! engine, only this trait. `InMemoryVectorStore` is the reference
//! implementation used for tests and local/offline operation, with an
//! optional JSONL snapshot so state survives a process restart.

mod cosine;
mod memory_store;

pub use cosine::cosine_distance;
pub use memory_store::{InMemoryVectorStore, RowFilter};

use async_trait::async_trait;
use memory_types::{Memory, MemoryError};

/// Black-box vector store contract: schema-typed append, row update by id,
/// delete by predicate, and cosine top-k search with a pre-filter.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn append(&self, row: Memory) -> Result<(), MemoryError>;

    /// Replaces the row with the same id. Errors if no such row exists.
    async fn update(&self, row: Memory) -> Result<(), MemoryError>;

    async fn get(&self, id: &str) -> Result<Option<Memory>, MemoryError>;

    /// Rows for `user_id` matching `filter`, in no particular order.
    async fn list(&self, user_id: &str, filter: &RowFilter) -> Result<Vec<Memory>, MemoryError>;

    /// Hard-deletes and returns every row for `user_id` matching `filter`.
    async fn delete_where(&self, user_id: &str, filter: &RowFilter) -> Result<Vec<Memory>, MemoryError>;

    /// Cosine top-`limit` nearest neighbors of `vector` among rows for
    /// `user_id` matching `filter`. Returns `(row, cosine_distance)` pairs
    /// sorted ascending by distance.
    async fn search(
        &self,
        user_id: &str,
        vector: &[f32],
        limit: usize,
        filter: &RowFilter,
    ) -> Result<Vec<(Memory, f32)>, MemoryError>;
}
