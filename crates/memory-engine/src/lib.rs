//! The memory lifecycle engine: the pipeline and state machine governing
//! how facts enter the store, how they are deduplicated, how they supersede
//! earlier contradicting facts, how aging types are collapsed or condensed,
//! and how search returns a ranked, score-blended result set.

mod ager;
mod deduper;
mod embedder;
mod engine;
mod extractor;
mod ranker;
mod versioner;

pub use embedder::Embedder;
pub use engine::{IngestEvent, IngestInput, IngestRequest, IngestResult, MemoryEngine};
pub use extractor::{ChatTurn, ContentPart, ExtractedFact, Extractor, MessageContent};
pub use ranker::SearchHit;
