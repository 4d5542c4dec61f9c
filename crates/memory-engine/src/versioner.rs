use std::collections::HashSet;

use memory_store::VectorStore;
use memory_types::{Memory, CONTRADICTION_CANDIDATE_DISTANCE, CONTRADICTION_CANDIDATE_LIMIT, STRUCTURAL_CONTRADICTION_DISTANCE};
use tracing::{debug, warn};

use crate::extractor::Extractor;

/// Runs the three-step versioning algorithm against a freshly-inserted row.
/// Triggered only on INSERT, and only by the caller checking
/// `!fact_type.skips_versioning()` first. Any failure along the way (store
/// read error, LLM failure, parse failure) is logged and yields zero
/// retirements — the newly inserted row always remains live.
pub async fn run(extractor: &Extractor, store: &dyn VectorStore, new_row: &Memory) -> usize {
    if new_row.fact_type.skips_versioning() {
        return 0;
    }

    let radius = if new_row.fact_type.is_structural() {
        STRUCTURAL_CONTRADICTION_DISTANCE
    } else {
        CONTRADICTION_CANDIDATE_DISTANCE
    };

    let new_id = new_row.id.clone();
    let candidates = match store
        .search(&new_row.user_id, &new_row.vector, CONTRADICTION_CANDIDATE_LIMIT, &|r| {
            r.id != new_id && r.is_live()
        })
        .await
    {
        Ok(rows) => rows
            .into_iter()
            .filter(|(_, distance)| *distance <= radius)
            .collect::<Vec<_>>(),
        Err(e) => {
            warn!(error = %e, "versioner candidate search failed, no retirements");
            return 0;
        }
    };

    if candidates.is_empty() {
        return 0;
    }

    let candidate_pairs: Vec<(String, String)> = candidates
        .iter()
        .map(|(row, _)| (row.id.clone(), row.memory.clone()))
        .collect();
    let candidate_ids: HashSet<&str> = candidate_pairs.iter().map(|(id, _)| id.as_str()).collect();

    let superseded_ids = extractor.classify_superseded(&new_row.memory, &candidate_pairs).await;

    let mut retired = 0;
    for id in superseded_ids {
        if !candidate_ids.contains(id.as_str()) {
            warn!(id = %id, "versioner ignoring id the LLM returned outside the candidate set");
            continue;
        }
        let row = match store.get(&id).await {
            Ok(Some(row)) => row,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, id = %id, "versioner could not load candidate for retirement");
                continue;
            }
        };
        let mut row = row;
        row.retire(&new_id);
        match store.update(row).await {
            Ok(()) => {
                retired += 1;
                debug!(id = %id, successor = %new_id, "retired superseded row");
            }
            Err(e) => warn!(error = %e, id = %id, "versioner failed to persist retirement"),
        }
    }

    retired
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use memory_llm::{ChatCapability, ChatUsage, NoopUsageSink};
    use memory_store::InMemoryVectorStore;
    use memory_types::{MemoryType, Metadata};
    use std::sync::Arc;

    struct ScriptedChat(String);

    #[async_trait]
    impl ChatCapability for ScriptedChat {
        async fn chat(&self, _system: &str, _user: &str) -> anyhow::Result<(String, ChatUsage)> {
            Ok((self.0.clone(), ChatUsage::default()))
        }
    }

    fn fact(user_id: &str, memory: &str, vector: Vec<f32>, fact_type: MemoryType) -> Memory {
        Memory::new_inserted(user_id, memory, fact_type, vector, "chunk", Metadata::new())
    }

    #[tokio::test]
    async fn retires_candidates_the_llm_names() {
        let store = InMemoryVectorStore::in_memory();
        let old = fact("u1", "Project uses SQLAlchemy ORM", vec![1.0, 0.0], MemoryType::TechContext);
        let old_id = old.id.clone();
        store.append(old).await.unwrap();

        let new_row = fact("u1", "Project switched to Tortoise ORM", vec![0.9, 0.436], MemoryType::TechContext);
        let chat = ScriptedChat(format!(r#"["{old_id}"]"#));
        let extractor = Extractor::new(Arc::new(chat), Arc::new(NoopUsageSink), "fake");

        let retired = run(&extractor, &store, &new_row).await;
        assert_eq!(retired, 1);
        let persisted = store.get(&old_id).await.unwrap().unwrap();
        assert_eq!(persisted.superseded_by, new_row.id);
    }

    #[tokio::test]
    async fn ignores_hallucinated_ids_outside_candidate_set() {
        let store = InMemoryVectorStore::in_memory();
        let old = fact("u1", "Project uses SQLAlchemy ORM", vec![1.0, 0.0], MemoryType::TechContext);
        let old_id = old.id.clone();
        store.append(old).await.unwrap();

        let new_row = fact("u1", "Project switched to Tortoise ORM", vec![0.9, 0.436], MemoryType::TechContext);
        let chat = ScriptedChat(r#"["not-a-real-id"]"#.to_string());
        let extractor = Extractor::new(Arc::new(chat), Arc::new(NoopUsageSink), "fake");

        let retired = run(&extractor, &store, &new_row).await;
        assert_eq!(retired, 0);
        let persisted = store.get(&old_id).await.unwrap().unwrap();
        assert!(persisted.is_live());
    }

    #[tokio::test]
    async fn versioning_skip_types_are_never_versioned() {
        let store = InMemoryVectorStore::in_memory();
        let new_row = fact("u1", "solo progress note", vec![1.0, 0.0], MemoryType::Progress);
        // Response would retire something if the guard weren't in place.
        let chat = ScriptedChat(format!(r#"["{}"]"#, new_row.id));
        let extractor = Extractor::new(Arc::new(chat), Arc::new(NoopUsageSink), "fake");
        assert_eq!(run(&extractor, &store, &new_row).await, 0);
    }
}
