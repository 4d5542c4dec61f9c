use std::sync::Arc;

use memory_llm::{
    condense_user, conversation_user, format_candidates, init_user, parse_id_array,
    parse_json_array, summary_user, supersession_user, ChatCapability, UsageSink,
    CONDENSE_SYSTEM, CONVERSATION_SYSTEM, INIT_SYSTEM, SUMMARY_SYSTEM, SUPERSESSION_SYSTEM,
};
use memory_types::MemoryType;
use serde::{Deserialize, Serialize};
use tracing::warn;

const CONVERSATION_TRUNCATE_CHARS: usize = 8_000;
const CONDENSE_TRUNCATE_CHARS: usize = 4_000;

/// One role-tagged turn of an ingested conversation. `content` mirrors the
/// two shapes the ingestion request accepts: a plain string, or a list of
/// `{"type":"text","text":"..."}` parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub part_type: String,
    #[serde(default)]
    pub text: String,
}

/// A fact candidate, type already resolved against the taxonomy. `chunk` is
/// the truncated source text the fact was extracted from, shared by every
/// fact produced from the same call — surfaced verbatim at search time.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFact {
    pub memory: String,
    pub fact_type: MemoryType,
    pub chunk: String,
}

fn flatten_messages(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|turn| {
            let text = match &turn.content {
                MessageContent::Text(s) => s.clone(),
                MessageContent::Parts(parts) => parts
                    .iter()
                    .filter(|p| p.part_type == "text")
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            };
            format!("[{}] {}", turn.role, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn resolve_type(raw: &str) -> MemoryType {
    MemoryType::parse(raw).unwrap_or(MemoryType::LearnedPattern)
}

/// The external LLM capability, wrapped with the three prompt modes, the
/// condense operation, and the supersession classifier.
pub struct Extractor {
    chat: Arc<dyn ChatCapability>,
    usage: Arc<dyn UsageSink>,
    provider_name: String,
}

impl Extractor {
    pub fn new(chat: Arc<dyn ChatCapability>, usage: Arc<dyn UsageSink>, provider_name: impl Into<String>) -> Self {
        Self {
            chat,
            usage,
            provider_name: provider_name.into(),
        }
    }

    /// Calls the LLM and returns its raw text, or an empty string on any
    /// upstream failure. Never propagates the error: the Extractor tolerates
    /// a flaky LLM by treating the call as having produced nothing.
    async fn call(&self, system: &str, user: &str) -> String {
        match self.chat.chat(system, user).await {
            Ok((text, usage)) => {
                self.usage.record_chat_usage(&self.provider_name, usage);
                text
            }
            Err(e) => {
                warn!(error = %e, "extractor upstream LLM call failed, treating as no facts");
                String::new()
            }
        }
    }

    pub async fn extract_conversation(&self, turns: &[ChatTurn]) -> Vec<ExtractedFact> {
        let flattened = truncate_chars(&flatten_messages(turns), CONVERSATION_TRUNCATE_CHARS);
        let response = self.call(CONVERSATION_SYSTEM, &conversation_user(&flattened)).await;
        parse_json_array(&response)
            .into_iter()
            .map(|f| ExtractedFact { memory: f.memory, fact_type: resolve_type(&f.r#type), chunk: flattened.clone() })
            .collect()
    }

    /// Summary mode must return exactly one `session-summary` fact; only the
    /// first item the LLM returns is kept, and its type is pinned regardless
    /// of what the model reported.
    pub async fn extract_summary(&self, turns: &[ChatTurn]) -> Vec<ExtractedFact> {
        let flattened = truncate_chars(&flatten_messages(turns), CONVERSATION_TRUNCATE_CHARS);
        let response = self.call(SUMMARY_SYSTEM, &summary_user(&flattened)).await;
        parse_json_array(&response)
            .into_iter()
            .take(1)
            .map(|f| ExtractedFact { memory: f.memory, fact_type: MemoryType::SessionSummary, chunk: flattened.clone() })
            .collect()
    }

    pub async fn extract_init(&self, project_files_text: &str) -> Vec<ExtractedFact> {
        let truncated = truncate_chars(project_files_text, CONVERSATION_TRUNCATE_CHARS);
        let response = self.call(INIT_SYSTEM, &init_user(&truncated)).await;
        parse_json_array(&response)
            .into_iter()
            .map(|f| ExtractedFact { memory: f.memory, fact_type: resolve_type(&f.r#type), chunk: truncated.clone() })
            .collect()
    }

    /// Condenses an aging-out session summary into a single `learned-pattern`
    /// fact. Returns `None` if the model produced nothing usable. The
    /// condensed row's `chunk` is left empty, per spec.
    pub async fn condense(&self, summary_text: &str) -> Option<ExtractedFact> {
        let truncated = truncate_chars(summary_text, CONDENSE_TRUNCATE_CHARS);
        let response = self.call(CONDENSE_SYSTEM, &condense_user(&truncated)).await;
        parse_json_array(&response)
            .into_iter()
            .next()
            .map(|f| ExtractedFact { memory: f.memory, fact_type: MemoryType::LearnedPattern, chunk: String::new() })
    }

    /// Returns the subset of `candidates` (by id) the LLM judges superseded
    /// by `new_text`. Ids the LLM invents that aren't in `candidates` are
    /// dropped by the caller, not here — this only parses the model's
    /// response.
    pub async fn classify_superseded(&self, new_text: &str, candidates: &[(String, String)]) -> Vec<String> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let formatted = format_candidates(candidates.iter().map(|(id, memory)| (id.as_str(), memory.as_str())));
        let response = self
            .call(SUPERSESSION_SYSTEM, &supersession_user(new_text, &formatted))
            .await;
        parse_id_array(&response)
    }
}
