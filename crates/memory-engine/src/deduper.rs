use memory_store::VectorStore;
use memory_types::{Memory, MemoryError, MemoryType, DEDUP_DISTANCE, STRUCTURAL_DEDUP_DISTANCE};

/// Top-1 cosine nearest-neighbor search restricted to `user_id`. Returns the
/// match if it is within the type-dependent distance threshold, else `None`.
/// Matches the original source's `find_duplicate`: no additional filter
/// (live or retired rows are both eligible matches).
pub async fn find_duplicate(
    store: &dyn VectorStore,
    user_id: &str,
    vector: &[f32],
    fact_type: MemoryType,
) -> Result<Option<Memory>, MemoryError> {
    let threshold = if fact_type.is_structural() {
        STRUCTURAL_DEDUP_DISTANCE
    } else {
        DEDUP_DISTANCE
    };

    let top = store.search(user_id, vector, 1, &|_| true).await?;
    Ok(top.into_iter().find(|(_, distance)| *distance <= threshold).map(|(row, _)| row))
}
