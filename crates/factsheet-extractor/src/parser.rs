//! Parse LLM output into fact candidates
//!
//! Model output is untrusted. Reading proceeds in stages:
//!
//! 1. strip a markdown code fence if present
//! 2. parse the whole text as JSON: an array of facts, an object with a
//!    `facts` array, or a single fact object
//! 3. otherwise, or when the JSON has some other shape, repair: try
//!    bracket-delimited array substrings, largest first, until one parses
//!
//! Individual fields are defaulted rather than rejected, so a partially
//! filled fact still survives as long as it has a name.

use crate::error::ExtractorError;
use crate::types::FactCandidate;
use factsheet_domain::{slugify, FactKind};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Parse an LLM response into fact candidates
///
/// Returns `SchemaViolation` only when no list of facts can be recovered
/// from the text at all.
pub fn parse_llm_response(response: &str) -> Result<Vec<FactCandidate>, ExtractorError> {
    let body = extract_json(response);
    if body.is_empty() {
        return Err(ExtractorError::SchemaViolation("Empty response".to_string()));
    }

    let items = match serde_json::from_str::<Value>(body) {
        Ok(value) => match fact_items(value) {
            Ok(items) => items,
            Err(e) => {
                debug!("Unexpected response shape ({}), attempting repair", e);
                repair(body).ok_or(e)?
            }
        },
        Err(e) => {
            debug!("Response is not valid JSON ({}), attempting repair", e);
            repair(body).ok_or_else(|| {
                ExtractorError::SchemaViolation(format!("No JSON array of facts found: {}", e))
            })?
        }
    };

    let mut candidates = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let Value::Object(obj) = item else {
            warn!("Fact {} is not a JSON object, skipping", idx);
            continue;
        };
        let candidate = parse_fact_object(&obj);
        if slugify(&candidate.name).is_empty() {
            warn!(name = %candidate.name, "Fact {} has no usable name, skipping", idx);
            continue;
        }
        candidates.push(candidate);
    }

    Ok(candidates)
}

/// Strip a surrounding markdown code fence, if any
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    // Skip the fence line itself (```json or ```)
    let after_fence = &trimmed[open + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Pull the list of fact values out of a parsed response
fn fact_items(value: Value) -> Result<Vec<Value>, ExtractorError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("facts") {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(ExtractorError::SchemaViolation(
                "'facts' is not an array".to_string(),
            )),
            None if obj.contains_key("name") => Ok(vec![Value::Object(obj)]),
            None => Err(ExtractorError::SchemaViolation(
                "Expected a JSON array or an object with 'facts'".to_string(),
            )),
        },
        other => Err(ExtractorError::SchemaViolation(format!(
            "Expected a JSON array, got {}",
            json_type(&other)
        ))),
    }
}

/// Recover the largest bracket-delimited array that parses
fn repair(text: &str) -> Option<Vec<Value>> {
    // First '[' to last ']' covers the common "prose around an array" case
    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if start < end {
            if let Ok(Value::Array(items)) = serde_json::from_str(&text[start..=end]) {
                debug!("Repaired response using outer brackets");
                return Some(items);
            }
        }
    }

    let mut spans = balanced_array_spans(text);
    spans.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)).then(a.0.cmp(&b.0)));
    spans.into_iter().find_map(|(start, end)| {
        match serde_json::from_str(&text[start..end]) {
            Ok(Value::Array(items)) => {
                debug!(start, end, "Repaired response using inner array");
                Some(items)
            }
            _ => None,
        }
    })
}

/// Byte spans of every balanced `[...]` in `text`, ignoring brackets inside strings
fn balanced_array_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => open.push(i),
            ']' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i + 1));
                }
            }
            _ => {}
        }
    }
    spans
}

/// Read one fact object, defaulting every missing or mistyped field
fn parse_fact_object(obj: &Map<String, Value>) -> FactCandidate {
    let name = string_field(obj, &["name", "label"]);
    let raw_value = string_field(obj, &["raw_value", "value"]);
    let raw_unit = string_field(obj, &["raw_unit", "unit"]);
    let evidence = string_field(obj, &["evidence", "quote", "source_text"]);
    let numeric = number_field(obj, &["numeric_value", "number"]);

    let kind = obj
        .get("kind")
        .and_then(Value::as_str)
        .and_then(FactKind::parse)
        .unwrap_or(if numeric.is_some() {
            FactKind::Quantity
        } else {
            FactKind::Categorical
        });

    FactCandidate {
        name,
        kind,
        raw_value,
        numeric_value: numeric.unwrap_or(0.0),
        raw_unit,
        aliases: aliases_field(obj),
        evidence,
    }
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| match obj.get(*key)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

fn number_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    })
}

fn aliases_field(obj: &Map<String, Value>) -> Vec<String> {
    match obj.get("aliases") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Parse a number written as text, e.g. "1,200.5" or " 3 000 "
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
