use std::sync::Arc;

use memory_store::VectorStore;
use memory_types::{validate_id, Memory, MemoryError, MemoryType, Metadata};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::deduper;
use crate::embedder::Embedder;
use crate::extractor::{ChatTurn, Extractor};
use crate::ranker::{self, SearchHit};
use crate::versioner;
use crate::ager;

/// What the Extractor should be pointed at for one ingestion request.
pub enum IngestInput {
    Conversation(Vec<ChatTurn>),
    Summary(Vec<ChatTurn>),
    ProjectFiles(String),
}

pub struct IngestRequest {
    pub user_id: String,
    pub input: IngestInput,
    /// Caller-supplied tags merged into every resulting row's metadata.
    pub tags: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IngestEvent {
    Add,
    Update,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResult {
    pub id: String,
    pub memory: String,
    pub event: IngestEvent,
}

/// The orchestrator: wires Extractor, Embedder, Deduper, Versioner, and
/// Ager together per the ingestion data flow, and exposes search/list/delete.
pub struct MemoryEngine {
    store: Arc<dyn VectorStore>,
    extractor: Extractor,
    embedder: Embedder,
    /// Names of missing required credentials, detected once at startup
    /// (typically via `memory_config::MemoryServiceConfig::validate_credentials`).
    /// `None` means fully configured. Gates `ingest`/`search`, the two
    /// data-plane operations that call out to the LLM/embedder.
    unconfigured: Option<String>,
}

impl MemoryEngine {
    pub fn new(store: Arc<dyn VectorStore>, extractor: Extractor, embedder: Embedder) -> Self {
        Self { store, extractor, embedder, unconfigured: None }
    }

    /// Same as `new`, but the engine will refuse every `ingest`/`search` call
    /// with `MemoryError::Unconfigured(missing)` until reconstructed with a
    /// complete credential set. `list`/`delete` are unaffected since they
    /// never call the LLM or embedder.
    pub fn new_unconfigured(
        store: Arc<dyn VectorStore>,
        extractor: Extractor,
        embedder: Embedder,
        missing: String,
    ) -> Self {
        Self { store, extractor, embedder, unconfigured: Some(missing) }
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn ingest(&self, request: IngestRequest) -> Result<Vec<IngestResult>, MemoryError> {
        if let Some(missing) = &self.unconfigured {
            return Err(MemoryError::Unconfigured(missing.clone()));
        }
        validate_id(&request.user_id)?;

        let facts = match request.input {
            IngestInput::Conversation(turns) => self.extractor.extract_conversation(&turns).await,
            IngestInput::Summary(turns) => self.extractor.extract_summary(&turns).await,
            IngestInput::ProjectFiles(text) => self.extractor.extract_init(&text).await,
        };

        let mut results = Vec::with_capacity(facts.len());
        for fact in facts {
            let mut metadata = Metadata(request.tags.clone());
            let vector = self.embedder.embed(&fact.memory, "document").await?;

            match deduper::find_duplicate(self.store.as_ref(), &request.user_id, &vector, fact.fact_type).await? {
                Some(mut existing) => {
                    existing.apply_update(fact.memory.clone(), fact.chunk.clone(), std::mem::take(&mut metadata));
                    self.store.update(existing.clone()).await?;
                    results.push(IngestResult { id: existing.id, memory: existing.memory, event: IngestEvent::Update });
                }
                None => {
                    let row = Memory::new_inserted(
                        &request.user_id,
                        fact.memory.clone(),
                        fact.fact_type,
                        vector,
                        fact.chunk.clone(),
                        std::mem::take(&mut metadata),
                    );
                    self.store.append(row.clone()).await?;

                    if !fact.fact_type.skips_versioning() {
                        let retired = versioner::run(&self.extractor, self.store.as_ref(), &row).await;
                        if retired > 0 {
                            info!(retired, id = %row.id, "versioner retired superseded rows");
                        }
                    }

                    ager::apply(&self.extractor, &self.embedder, self.store.as_ref(), &row).await;

                    results.push(IngestResult { id: row.id, memory: row.memory, event: IngestEvent::Add });
                }
            }
        }

        Ok(results)
    }

    /// Oldest-updated-last; excludes retired rows unless `include_superseded`.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: &str, limit: usize, include_superseded: bool) -> Result<Vec<Memory>, MemoryError> {
        validate_id(user_id)?;
        let mut rows = self
            .store
            .list(user_id, &|r| include_superseded || r.is_live())
            .await?;
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rows.truncate(limit);
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
        threshold: f32,
        recency_weight: f32,
    ) -> Result<Vec<SearchHit>, MemoryError> {
        if let Some(missing) = &self.unconfigured {
            return Err(MemoryError::Unconfigured(missing.clone()));
        }
        validate_id(user_id)?;
        let vector = self.embedder.embed(query, "query").await?;
        ranker::search(self.store.as_ref(), user_id, &vector, limit, threshold, recency_weight).await
    }

    /// Unconditional delete by id.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, memory_id: &str) -> Result<bool, MemoryError> {
        validate_id(user_id)?;
        validate_id(memory_id)?;
        let deleted = self.store.delete_where(user_id, &|r| r.id == memory_id).await?;
        Ok(!deleted.is_empty())
    }
}
