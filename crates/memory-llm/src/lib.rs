//! External LLM/embedder capability boundary: provider dispatch, the JSON
//! repair rules the Extractor depends on, and the prompt templates for its
//! five call sites.

mod capability;
mod json_repair;
mod prompts;
mod providers;

pub use capability::{ChatCapability, ChatUsage, EmbedCapability, NoopUsageSink, UsageSink};
pub use json_repair::{parse_id_array, parse_json_array, RawFact};
pub use providers::{AnthropicClient, GoogleClient, Provider, XaiClient};
pub use prompts::{
    condense_user, conversation_user, format_candidates, init_user, summary_user,
    supersession_user, CONDENSE_SYSTEM, CONVERSATION_SYSTEM, INIT_SYSTEM, SUMMARY_SYSTEM,
    SUPERSESSION_SYSTEM,
};
