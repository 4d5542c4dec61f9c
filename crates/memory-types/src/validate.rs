use std::sync::OnceLock;

use regex::Regex;

use crate::MemoryError;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("static pattern is valid"))
}

/// Guards every `user_id`/`memory_id` crossing the API boundary. Ids are
/// interpolated into the vector store's `where` predicate, so rejecting
/// anything outside this charset here is the only injection barrier.
pub fn validate_id(id: &str) -> Result<(), MemoryError> {
    if id.is_empty() || !id_pattern().is_match(id) {
        return Err(MemoryError::InvalidId(id.to_string()));
    }
    Ok(())
}
