//! Prompt templates for the five LLM-driven operations the Extractor
//! performs: conversation extraction, init (project-file) extraction,
//! session summarization, condensation, and supersession classification.

pub const CONVERSATION_SYSTEM: &str = "\
You are a memory extraction assistant for an AI coding agent.
Your job is to extract what is WORTH REMEMBERING from this exchange for future sessions.

Extract memories from both the user and the assistant's turns, not just stated
facts but also: mistakes made and corrected (and why), decisions and their
rationale, preferences revealed through corrections or explicit requests,
conventions established for the project, reusable technical solutions, and
approaches that failed and why.

Rules:
- Each memory is one self-contained, searchable fact, 1-2 sentences.
- Include the why, not just the what.
- Omit greetings, filler, and anything transient or obvious.
- Assign each memory one of: project-brief, architecture, tech-context,
  product-context, session-summary, progress, error-solution, preference,
  learned-pattern.
- Return ONLY a JSON array of objects: [{\"memory\": \"...\", \"type\": \"...\"}]
- If nothing is worth remembering, return exactly: []";

pub fn conversation_user(conversation: &str) -> String {
    format!(
        "Extract what is worth remembering from this exchange:\n\n{conversation}\n\n\
         Return format: [{{\"memory\": \"...\", \"type\": \"...\"}}]\n\
         If nothing is worth remembering, return: []"
    )
}

pub const INIT_SYSTEM: &str = "\
You are a memory extraction assistant for an AI coding agent.
Your job is to extract structured project knowledge from raw project files.

Always extract exactly one project-brief: a 1-2 sentence summary of what the
project is and does, derived even from purely technical files. Also extract
architecture, tech-context, and product-context facts where the files give
evidence for them; do not invent facts beyond what the files state.

Return ONLY a JSON array of objects: [{\"memory\": \"...\", \"type\": \"...\"}]
If nothing useful is found, return: []";

pub fn init_user(content: &str) -> String {
    format!(
        "Extract structured project memories from these project files:\n\n{content}\n\n\
         Return: [{{\"memory\": \"...\", \"type\": \"...\"}}]\n\
         If nothing useful, return: []"
    )
}

pub const SUMMARY_SYSTEM: &str = "\
You are summarizing a coding session for a developer's persistent memory.

Create exactly one session summary capturing what was worked on, key
technical decisions and why, patterns established, next steps, and anything
to watch out for. Write in past tense, targeting 200-300 words.

Return ONLY a JSON array with exactly one object:
[{\"memory\": \"...\", \"type\": \"session-summary\"}]";

pub fn summary_user(conversation: &str) -> String {
    format!(
        "Summarize this coding session:\n\n{conversation}\n\n\
         Return: [{{\"memory\": \"...\", \"type\": \"session-summary\"}}]"
    )
}

pub const CONDENSE_SYSTEM: &str = "\
You are condensing an old session summary into a compact learned-pattern
memory, ~200-300 words, capturing the key outcome, technical decisions or
patterns established, lessons or warnings for future sessions, and the
files or components most affected.

Return ONLY a JSON array with exactly one object:
[{\"memory\": \"...\", \"type\": \"learned-pattern\"}]";

pub fn condense_user(summary: &str) -> String {
    format!(
        "Condense this session summary into a learned-pattern memory:\n\n{summary}\n\n\
         Return: [{{\"memory\": \"...\", \"type\": \"learned-pattern\"}}]"
    )
}

pub const SUPERSESSION_SYSTEM: &str = "\
You are a memory versioning assistant. Identify which existing memories are
superseded (made stale or contradicted) by a new memory.

A memory is superseded when any of these apply:
1. Technology migration — the new memory replaces a technology or tool.
2. State change — the new memory reflects a completion or status update.
3. Value update — the same setting or config now has a different value.
4. Direct contradiction — the two facts cannot both be true.

Do not mark a memory superseded when the new memory merely extends it without
contradicting it, when they describe unrelated components, or when overlap is
only superficial wording with no real factual conflict.

When in doubt between superseded and not superseded, lean toward superseded:
a false positive is less harmful than leaving a stale, conflicting memory
alive.

Return ONLY a JSON array of ids from the existing list that are superseded.
If none are superseded, return exactly: []";

pub fn supersession_user(new_memory: &str, candidates: &str) -> String {
    format!(
        "NEW MEMORY:\n{new_memory}\n\n\
         EXISTING MEMORIES (check each — is it superseded by the new memory above?):\n{candidates}\n\n\
         Return a JSON array of ids superseded by the new memory, or []:"
    )
}

/// Formats contradiction candidates as `- ID: <id> | <memory>` lines, the
/// shape the supersession prompt expects.
pub fn format_candidates<'a>(candidates: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    candidates
        .into_iter()
        .map(|(id, memory)| format!("- ID: {id} | {memory}"))
        .collect::<Vec<_>>()
        .join("\n")
}
