use thiserror::Error;

/// Error kinds the memory lifecycle engine surfaces to callers.
///
/// Propagation policy (spec'd in the ingestion pipeline, not here): the
/// Extractor and Versioner tolerate `Parse`/`UpstreamLlm` by returning empty
/// results; the Deduper and Ager tolerate `Store` on read by returning
/// empty results. Only the ingestion orchestrator lets these escape to the
/// caller.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Required provider credentials are missing at startup. The message
    /// names the missing variables; it must never include their values.
    #[error("memory service is unconfigured: missing {0}")]
    Unconfigured(String),

    #[error("invalid id: {0:?} does not match ^[A-Za-z0-9_.-]+$")]
    InvalidId(String),

    #[error("upstream LLM error: {0}")]
    UpstreamLlm(String),

    #[error("upstream embedding error: {0}")]
    UpstreamEmbed(String),

    #[error("failed to parse LLM output")]
    Parse,

    #[error("vector store error: {0}")]
    Store(String),
}
