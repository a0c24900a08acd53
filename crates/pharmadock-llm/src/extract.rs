//! Lenient JSON extraction from model replies.
//!
//! Extraction prompts ask for a bare JSON object, but replies arrive wrapped
//! in code fences, with trailing commas, unquoted keys or Python literals.
//! Parsing tries the text as-is, then the outermost `{...}` slice, then a
//! line-by-line repair.

use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn parse_object(text: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn repair_value(raw: &str) -> String {
    match raw.trim() {
        "True" | "'True'" => "true".to_string(),
        "False" | "'False'" => "false".to_string(),
        "None" | "" => "null".to_string(),
        v if v.starts_with('\'') && v.ends_with('\'') && v.len() >= 2 => {
            format!("\"{}\"", &v[1..v.len() - 1])
        }
        v => v.to_string(),
    }
}

/// Rebuild a `{ key: value, ... }` object one line at a time.
fn repair(text: &str) -> String {
    let inner = text.trim().trim_start_matches('{').trim_end_matches('}');
    let mut fields = Vec::new();

    for line in inner.lines() {
        let line = line.trim().trim_end_matches(',');
        if line.is_empty() || line.starts_with('{') || line.ends_with('}') {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => {
                let key = key.trim().trim_matches(|c| c == '"' || c == '\'');
                fields.push(format!("\"{}\": {}", key, repair_value(value)));
            }
            None => fields.push(line.to_string()),
        }
    }

    format!("{{{}}}", fields.join(","))
}

/// Best-effort JSON object from a model reply.
pub fn extract_object(text: &str) -> Option<JsonObject> {
    let cleaned = strip_fences(text);
    if let Some(map) = parse_object(&cleaned) {
        return Some(map);
    }

    let sliced = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => cleaned.as_str(),
    };
    if let Some(map) = parse_object(sliced) {
        return Some(map);
    }

    let repaired = repair(sliced);
    let parsed = parse_object(&repaired);
    if parsed.is_none() {
        tracing::error!(reply = %text, "could not decode JSON from model reply");
    }
    parsed
}

/// A field as a non-empty string; numbers and booleans are stringified,
/// null-ish values are `None`.
pub fn field_str(map: &JsonObject, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            match s {
                "" | "null" | "None" => None,
                _ => Some(s.to_string()),
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A field interpreted as a flag: `true`, `"true"` and `"True"` are set.
pub fn field_flag(map: &JsonObject, key: &str) -> bool {
    match map.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneDrug {
    pub protein: Option<String>,
    pub drug: Option<String>,
}

pub fn gene_and_drug(reply: &str) -> GeneDrug {
    match extract_object(reply) {
        Some(map) => GeneDrug {
            protein: field_str(&map, "protein"),
            drug: field_str(&map, "drug"),
        },
        None => GeneDrug::default(),
    }
}

pub fn pdb_id(reply: &str) -> Option<String> {
    extract_object(reply).and_then(|map| field_str(&map, "pdb"))
}
