use std::sync::Arc;

use memory_llm::{EmbedCapability, UsageSink};
use memory_types::{MemoryError, EMBEDDING_DIMS};

/// Wraps the raw `EmbedCapability` with the unit-norm and dimensionality
/// guarantees the rest of the pipeline relies on, plus usage recording.
pub struct Embedder {
    capability: Arc<dyn EmbedCapability>,
    usage: Arc<dyn UsageSink>,
    provider_name: String,
}

impl Embedder {
    pub fn new(
        capability: Arc<dyn EmbedCapability>,
        usage: Arc<dyn UsageSink>,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            capability,
            usage,
            provider_name: provider_name.into(),
        }
    }

    pub async fn embed(&self, text: &str, role: &str) -> Result<Vec<f32>, MemoryError> {
        let mut vector = self
            .capability
            .embed(text, role)
            .await
            .map_err(|e| MemoryError::UpstreamEmbed(e.to_string()))?;

        if vector.len() != EMBEDDING_DIMS {
            return Err(MemoryError::UpstreamEmbed(format!(
                "expected {EMBEDDING_DIMS} dims, got {}",
                vector.len()
            )));
        }

        normalize(&mut vector);
        self.usage
            .record_embed_usage(&self.provider_name, approximate_tokens(text));
        Ok(vector)
    }
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

fn approximate_tokens(text: &str) -> u64 {
    (text.len() / 4).max(1) as u64
}
