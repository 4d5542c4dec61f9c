use memory_store::VectorStore;
use memory_types::{Memory, MemoryType, Metadata, MAX_SESSION_SUMMARIES};
use tracing::warn;

use crate::embedder::Embedder;
use crate::extractor::Extractor;

/// Enforces the per-type rolling-window rules after every successful INSERT.
/// Store read/write failures are tolerated: the Ager is idempotent and will
/// converge on the next ingestion of the same type.
pub async fn apply(extractor: &Extractor, embedder: &Embedder, store: &dyn VectorStore, inserted: &Memory) {
    match inserted.fact_type {
        MemoryType::Progress => age_progress(store, inserted).await,
        MemoryType::SessionSummary => age_session_summaries(extractor, embedder, store, &inserted.user_id).await,
        _ => {}
    }
}

async fn age_progress(store: &dyn VectorStore, inserted: &Memory) {
    let new_id = inserted.id.clone();
    let result = store
        .delete_where(&inserted.user_id, &|r| {
            r.fact_type == MemoryType::Progress && r.id != new_id && r.is_live()
        })
        .await;
    if let Err(e) = result {
        warn!(error = %e, "ager failed to collapse progress rows, will retry next insert");
    }
}

async fn age_session_summaries(extractor: &Extractor, embedder: &Embedder, store: &dyn VectorStore, user_id: &str) {
    let mut rows = match store
        .list(user_id, &|r| r.fact_type == MemoryType::SessionSummary && r.is_live())
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "ager failed to list session summaries, will retry next insert");
            return;
        }
    };

    if rows.len() <= MAX_SESSION_SUMMARIES {
        return;
    }

    rows.sort_by_key(|r| r.created_at);
    let oldest = &rows[0];

    let Some(condensed) = extractor.condense(&oldest.memory).await else {
        // Condensation failed: per spec, do not delete the oldest row. This
        // deliberately diverges from an unconditional-delete policy.
        return;
    };

    let vector = match embedder.embed(&condensed.memory, "document").await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "ager failed to embed condensed learned-pattern, leaving oldest summary in place");
            return;
        }
    };

    let mut metadata = Metadata::new();
    metadata.set_condensed_from(&oldest.id);
    let condensed_row = Memory::new_inserted(user_id, condensed.memory, MemoryType::LearnedPattern, vector, "", metadata);

    // The condensed row is inserted directly: it does not run through the
    // Deduper, Versioner, or Ager recursively.
    if let Err(e) = store.append(condensed_row).await {
        warn!(error = %e, "ager failed to insert condensed learned-pattern, leaving oldest summary in place");
        return;
    }

    if let Err(e) = store.delete_where(user_id, &|r| r.id == oldest.id).await {
        warn!(error = %e, "ager inserted condensed pattern but failed to delete the oldest summary");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use memory_llm::{ChatCapability, ChatUsage, NoopUsageSink};
    use memory_store::InMemoryVectorStore;
    use memory_types::EMBEDDING_DIMS;
    use std::sync::Arc;

    struct ScriptedChat(String);

    #[async_trait]
    impl ChatCapability for ScriptedChat {
        async fn chat(&self, _system: &str, _user: &str) -> anyhow::Result<(String, ChatUsage)> {
            Ok((self.0.clone(), ChatUsage::default()))
        }
    }

    struct FailingChat;

    #[async_trait]
    impl ChatCapability for FailingChat {
        async fn chat(&self, _system: &str, _user: &str) -> anyhow::Result<(String, ChatUsage)> {
            anyhow::bail!("down")
        }
    }

    struct FakeEmbedCap;

    #[async_trait]
    impl memory_llm::EmbedCapability for FakeEmbedCap {
        async fn embed(&self, _text: &str, _role: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![1.0; EMBEDDING_DIMS])
        }
    }

    fn fact(user_id: &str, memory: &str, fact_type: MemoryType) -> Memory {
        Memory::new_inserted(user_id, memory, fact_type, vec![1.0, 0.0], "chunk", Metadata::new())
    }

    fn fake_embedder() -> Embedder {
        Embedder::new(Arc::new(FakeEmbedCap), Arc::new(NoopUsageSink), "fake")
    }

    #[tokio::test]
    async fn progress_collapse_keeps_only_newest() {
        let store = InMemoryVectorStore::in_memory();
        let a = fact("u1", "A", MemoryType::Progress);
        let b = fact("u1", "B", MemoryType::Progress);
        let c = fact("u1", "C", MemoryType::Progress);
        store.append(a).await.unwrap();
        store.append(b).await.unwrap();
        store.append(c.clone()).await.unwrap();

        apply(
            &Extractor::new(Arc::new(ScriptedChat("[]".into())), Arc::new(NoopUsageSink), "fake"),
            &fake_embedder(),
            &store,
            &c,
        )
        .await;

        let remaining = store.list("u1", &|r| r.fact_type == MemoryType::Progress && r.is_live()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].memory, "C");
    }

    #[tokio::test]
    async fn session_summary_condensation_deletes_oldest_on_success() {
        let store = InMemoryVectorStore::in_memory();
        let mut inserted = Vec::new();
        for label in ["S1", "S2", "S3", "S4"] {
            let row = fact("u1", label, MemoryType::SessionSummary);
            store.append(row.clone()).await.unwrap();
            inserted.push(row);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let extractor = Extractor::new(
            Arc::new(ScriptedChat(r#"[{"memory":"condensed S1","type":"learned-pattern"}]"#.into())),
            Arc::new(NoopUsageSink),
            "fake",
        );
        apply(&extractor, &fake_embedder(), &store, inserted.last().unwrap()).await;

        let live_summaries = store.list("u1", &|r| r.fact_type == MemoryType::SessionSummary && r.is_live()).await.unwrap();
        assert_eq!(live_summaries.len(), 3);
        assert!(!live_summaries.iter().any(|r| r.memory == "S1"));

        let patterns = store.list("u1", &|r| r.fact_type == MemoryType::LearnedPattern).await.unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].metadata.condensed_from(), Some(inserted[0].id.as_str()));
    }

    #[tokio::test]
    async fn condensation_failure_does_not_delete_oldest() {
        let store = InMemoryVectorStore::in_memory();
        let mut inserted = Vec::new();
        for label in ["S1", "S2", "S3", "S4"] {
            let row = fact("u1", label, MemoryType::SessionSummary);
            store.append(row.clone()).await.unwrap();
            inserted.push(row);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let extractor = Extractor::new(Arc::new(FailingChat), Arc::new(NoopUsageSink), "fake");
        apply(&extractor, &fake_embedder(), &store, inserted.last().unwrap()).await;

        let live_summaries = store.list("u1", &|r| r.fact_type == MemoryType::SessionSummary && r.is_live()).await.unwrap();
        assert_eq!(live_summaries.len(), 4, "oldest row must survive a failed condensation");
    }
}
