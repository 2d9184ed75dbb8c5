//! Parse oracle output into validated candidates
//!
//! The oracle's response is an untrusted JSON document, possibly wrapped in
//! markdown fences. Parsing is per-item: a candidate that fails to
//! deserialize (an off-vocabulary enum value fails right here) or fails
//! validation is rejected with a warning while the rest of the array
//! survives. Only a response that is not a JSON array at all rejects the
//! whole call.

use serde::de::DeserializeOwned;
use tracing::warn;

/// Parse a response into candidates, keeping every item that deserializes
/// and validates. Returns the kept candidates and one message per rejected
/// item.
pub(crate) fn parse_candidates<T, V>(
    response: &str,
    validate: V,
) -> Result<(Vec<T>, Vec<String>), String>
where
    T: DeserializeOwned,
    V: Fn(&T) -> Result<(), String>,
{
    let json_str = extract_json(response)?;

    let json: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| format!("JSON parse error: {}", e))?;

    let items = json
        .as_array()
        .ok_or_else(|| "expected a JSON array".to_string())?;

    let mut candidates = Vec::new();
    let mut rejections = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(candidate) => match validate(&candidate) {
                Ok(()) => candidates.push(candidate),
                Err(e) => {
                    warn!("candidate {} failed validation: {}", idx, e);
                    rejections.push(format!("item {}: {}", idx, e));
                }
            },
            Err(e) => {
                warn!("candidate {} failed to deserialize: {}", idx, e);
                rejections.push(format!("item {}: {}", idx, e));
            }
        }
    }

    Ok((candidates, rejections))
}

/// Extract JSON from a response, handling markdown code blocks.
fn extract_json(response: &str) -> Result<String, String> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err("empty code block".to_string());
        }
        // Skip the opening fence line and the closing fence
        let json_lines = &lines[1..lines.len().saturating_sub(1)];
        Ok(json_lines.join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}
