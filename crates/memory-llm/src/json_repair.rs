use serde_json::Value;

/// One `{memory, type}` candidate recovered from an LLM response, before
/// the type string is resolved against the taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFact {
    pub memory: String,
    pub r#type: String,
}

/// Applies the JSON repair rules to an LLM's raw text response and returns
/// the list of candidate facts. Never fails — any parse problem degrades to
/// an empty list, since "the model didn't produce facts" is not an error
/// condition for the pipeline.
pub fn parse_json_array(raw: &str) -> Vec<RawFact> {
    let fenced = strip_fence(raw);
    let trimmed = fenced.trim();

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    coerce_array(&value).unwrap_or_default()
}

fn strip_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let after_open = &trimmed[3..];
    let after_open = after_open.strip_prefix("json").unwrap_or(after_open);
    let after_open = after_open.strip_prefix('\n').unwrap_or(after_open);
    match after_open.rfind("```") {
        Some(end) => after_open[..end].to_string(),
        None => after_open.to_string(),
    }
}

fn coerce_array(value: &Value) -> Option<Vec<RawFact>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(coerce_item)
                .filter(|f| !f.memory.trim().is_empty())
                .collect(),
        ),
        Value::Object(map) => {
            let first_array = map.values().find_map(|v| v.as_array());
            first_array.map(|items| {
                items
                    .iter()
                    .filter_map(coerce_item)
                    .filter(|f| !f.memory.trim().is_empty())
                    .collect()
            })
        }
        _ => None,
    }
}

fn coerce_item(value: &Value) -> Option<RawFact> {
    match value {
        Value::String(s) => Some(RawFact {
            memory: s.trim().to_string(),
            r#type: "learned-pattern".to_string(),
        }),
        Value::Object(map) => {
            let memory = map.get("memory").and_then(Value::as_str)?.trim().to_string();
            if memory.is_empty() {
                return None;
            }
            let r#type = map
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("learned-pattern")
                .to_string();
            Some(RawFact { memory, r#type })
        }
        _ => None,
    }
}

/// Parses the supersession classifier's response: a JSON array of id
/// strings. Same "never fails" posture as `parse_json_array`.
pub fn parse_id_array(raw: &str) -> Vec<String> {
    let fenced = strip_fence(raw);
    let trimmed = fenced.trim();
    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_array_of_objects() {
        let raw = r#"[{"memory":"Use bun","type":"preference"}]"#;
        let facts = parse_json_array(raw);
        assert_eq!(facts, vec![RawFact { memory: "Use bun".into(), r#type: "preference".into() }]);
    }

    #[test]
    fn coerces_bare_strings_to_learned_pattern() {
        let raw = r#"["Switched to Tortoise ORM"]"#;
        let facts = parse_json_array(raw);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].r#type, "learned-pattern");
    }

    #[test]
    fn strips_json_fence_and_tag() {
        let raw = "```json\n[{\"memory\":\"fact one\",\"type\":\"architecture\"}]\n```";
        let facts = parse_json_array(raw);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].memory, "fact one");
    }

    #[test]
    fn descends_into_first_array_valued_field_of_an_object() {
        let raw = r#"{"facts": [{"memory":"nested fact","type":"progress"}]}"#;
        let facts = parse_json_array(raw);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].memory, "nested fact");
    }

    #[test]
    fn drops_items_with_empty_memory() {
        let raw = r#"[{"memory":"  ","type":"preference"}, {"memory":"kept","type":"preference"}]"#;
        let facts = parse_json_array(raw);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].memory, "kept");
    }

    #[test]
    fn unparseable_input_yields_empty_list_never_panics() {
        assert!(parse_json_array("not json at all").is_empty());
        assert!(parse_json_array("").is_empty());
    }

    #[test]
    fn id_array_parses_and_trims() {
        let raw = "```json\n[\"id-1\", \"id-2\"]\n```";
        assert_eq!(parse_id_array(raw), vec!["id-1".to_string(), "id-2".to_string()]);
    }

    #[test]
    fn id_array_unparseable_yields_empty() {
        assert!(parse_id_array("nonsense").is_empty());
    }
}
