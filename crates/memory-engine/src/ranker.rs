use chrono::NaiveDate;
use memory_store::VectorStore;
use memory_types::{Memory, MemoryError, Metadata};

/// One scored, sorted search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub memory: String,
    pub chunk: String,
    pub score: f32,
    pub metadata: Metadata,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub date: Option<NaiveDate>,
}

/// `search(user_id, query_vector, limit, threshold, recency_weight)`.
/// Assumes `query_vector` is already embedded in the `"query"` role.
pub async fn search(
    store: &dyn VectorStore,
    user_id: &str,
    query_vector: &[f32],
    limit: usize,
    threshold: f32,
    recency_weight: f32,
) -> Result<Vec<SearchHit>, MemoryError> {
    let candidates = store.search(user_id, query_vector, limit, &|r| r.is_live()).await?;

    let mut scored: Vec<(Memory, f32, f32)> = candidates
        .into_iter()
        .map(|(row, distance)| {
            let semantic = (1.0 - distance).max(0.0);
            (row, distance, semantic)
        })
        .collect();

    let final_scores: Vec<f32> = if recency_weight > 0.0 {
        let dated: Vec<NaiveDate> = scored
            .iter()
            .filter_map(|(row, _, _)| row.session_date())
            .collect();

        if dated.is_empty() {
            scored.iter().map(|(_, _, semantic)| *semantic).collect()
        } else {
            let max_date = dated.into_iter().max().unwrap();
            scored
                .iter()
                .map(|(row, _, semantic)| {
                    let recency = match row.session_date() {
                        Some(d) => {
                            let delta_days = (max_date - d).num_days().max(0) as f64;
                            (-0.1 * delta_days).exp() as f32
                        }
                        None => 0.0,
                    };
                    (1.0 - recency_weight) * semantic + recency_weight * recency
                })
                .collect()
        }
    } else {
        scored.iter().map(|(_, _, semantic)| *semantic).collect()
    };

    let mut hits: Vec<SearchHit> = scored
        .into_iter()
        .zip(final_scores)
        .filter_map(|((row, _, _), score)| {
            if score < threshold {
                return None;
            }
            let date = row.session_date();
            Some(SearchHit {
                id: row.id,
                memory: row.memory,
                chunk: row.chunk,
                score,
                metadata: row.metadata,
                created_at: row.created_at,
                date,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_store::InMemoryVectorStore;
    use memory_types::MemoryType;

    fn fact_with_date(user_id: &str, memory: &str, vector: Vec<f32>, date: &str) -> Memory {
        let mut metadata = Metadata::new();
        metadata.set_date(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap());
        Memory::new_inserted(user_id, memory, MemoryType::Preference, vector, "chunk", metadata)
    }

    #[tokio::test]
    async fn pure_semantic_search_sorts_descending_and_applies_threshold() {
        let store = InMemoryVectorStore::in_memory();
        store.append(fact_with_date("u1", "near", vec![1.0, 0.0], "2026-01-01")).await.unwrap();
        store.append(fact_with_date("u1", "far", vec![0.0, 1.0], "2026-01-01")).await.unwrap();

        let hits = search(&store, "u1", &[1.0, 0.0], 5, 0.3, 0.0).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].memory, "near");
    }

    #[tokio::test]
    async fn retired_rows_are_excluded() {
        let store = InMemoryVectorStore::in_memory();
        let mut row = fact_with_date("u1", "retired fact", vec![1.0, 0.0], "2026-01-01");
        row.retire("someone-else");
        store.append(row).await.unwrap();

        let hits = search(&store, "u1", &[1.0, 0.0], 5, 0.0, 0.0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn recency_blend_prefers_the_later_dated_row_given_identical_vectors() {
        let store = InMemoryVectorStore::in_memory();
        store.append(fact_with_date("u1", "older", vec![1.0, 0.0], "2026-01-01")).await.unwrap();
        store.append(fact_with_date("u1", "newer", vec![1.0, 0.0], "2026-02-01")).await.unwrap();

        let hits = search(&store, "u1", &[1.0, 0.0], 5, 0.0, 0.5).await.unwrap();
        assert_eq!(hits[0].memory, "newer");

        let expected_gap = 0.5 * (1.0 - (-0.1_f32 * 31.0).exp());
        let gap = hits[0].score - hits[1].score;
        assert!((gap - expected_gap).abs() < 1e-3, "gap={gap} expected={expected_gap}");
    }

    #[tokio::test]
    async fn unparseable_date_scores_zero_recency_not_a_created_at_fallback() {
        let store = InMemoryVectorStore::in_memory();
        store.append(fact_with_date("u1", "well dated", vec![1.0, 0.0], "2026-02-01")).await.unwrap();

        let mut bad_metadata = Metadata::new();
        bad_metadata.0.insert("date".to_string(), serde_json::Value::String("not-a-date".to_string()));
        store
            .append(Memory::new_inserted("u1", "malformed date", MemoryType::Preference, vec![1.0, 0.0], "chunk", bad_metadata))
            .await
            .unwrap();

        let hits = search(&store, "u1", &[1.0, 0.0], 5, 0.0, 0.5).await.unwrap();
        let malformed_hit = hits.iter().find(|h| h.memory == "malformed date").unwrap();
        let dated_hit = hits.iter().find(|h| h.memory == "well dated").unwrap();

        // semantic = 1.0 for both (identical vectors); recency = 0 for the
        // malformed-date row, so its score is exactly (1 - w) * semantic.
        assert!((malformed_hit.score - 0.5).abs() < 1e-5, "score={}", malformed_hit.score);
        assert!(dated_hit.score > malformed_hit.score);
    }
}
