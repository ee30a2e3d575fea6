//! Parsing schema-constrained answers out of model text.

use brain_common::{BrainError, Result};
use serde::de::DeserializeOwned;

/// Find the first balanced JSON object in `s`.
///
/// Models sometimes wrap structured answers in prose or code fences; this
/// picks out the object itself. Braces inside string literals are skipped.
pub fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s[start..].char_indices() {
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
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Deserialize the first JSON object found in a model answer.
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T> {
    let json = extract_json_object(content).ok_or_else(|| {
        BrainError::Capability(format!(
            "No JSON object in response: {}",
            content.chars().take(120).collect::<String>()
        ))
    })?;
    Ok(serde_json::from_str(json)?)
}
