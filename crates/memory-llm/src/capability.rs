use async_trait::async_trait;

/// Token usage reported by a single chat call, for the telemetry boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatUsage {
    pub prompt_tokens: u64,
    pub cached_tokens: u64,
    pub completion_tokens: u64,
}

/// The external LLM chat capability the Extractor depends on. Provider
/// shapes never leak past this trait.
#[async_trait]
pub trait ChatCapability: Send + Sync {
    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<(String, ChatUsage)>;
}

/// The external embedding capability. `role` is `"document"` or `"query"`;
/// output must be unit-norm and exactly `EMBEDDING_DIMS` long.
#[async_trait]
pub trait EmbedCapability: Send + Sync {
    async fn embed(&self, text: &str, role: &str) -> anyhow::Result<Vec<f32>>;
}

/// Non-blocking usage recording sink. The core calls this via `record_*`
/// methods but never inspects cost/activity state itself — cost ledger and
/// activity log persistence are out of scope for the engine.
pub trait UsageSink: Send + Sync {
    fn record_chat_usage(&self, provider: &str, usage: ChatUsage);
    fn record_embed_usage(&self, provider: &str, tokens: u64);
}

/// Default sink that discards everything. Used when no telemetry collector
/// is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUsageSink;

impl UsageSink for NoopUsageSink {
    fn record_chat_usage(&self, _provider: &str, _usage: ChatUsage) {}
    fn record_embed_usage(&self, _provider: &str, _tokens: u64) {}
}
