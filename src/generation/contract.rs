use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{GenerationError, Result};

/// A structured shape the backend must return.
///
/// Field names, types and enumerations are enforced by decoding into `Self`.
/// Cardinality is declared with `#[validate(...)]` attributes, which `schemars`
/// also folds into the schema sent to the backend. Anything neither can express
/// goes in `conformance`.
pub trait Contract: DeserializeOwned + JsonSchema + Send + 'static {
    /// Name of the shape as the backend sees it.
    const NAME: &'static str;

    fn conformance(&self) -> std::result::Result<(), String>;
}

pub fn schema_value<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or_default()
}

/// Strip a single surrounding Markdown code fence, if present.
pub fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };

    match body.split_once('\n') {
        // Opening fence carries a language tag such as `json`.
        Some((tag, inner)) if !tag.contains(['{', '[']) => inner.trim(),
        _ => body.trim(),
    }
}

/// Decode a raw completion into `T`, failing with `SchemaViolation` on any
/// mismatch. Nothing is coerced.
pub fn decode<T: Contract>(raw: &str) -> Result<T> {
    let json = extract_json(raw);
    if json.is_empty() {
        return Err(GenerationError::schema(T::NAME, "empty reply"));
    }

    let value: T = serde_json::from_str(json)
        .map_err(|e| GenerationError::schema(T::NAME, e.to_string()))?;

    value
        .conformance()
        .map_err(|reason| GenerationError::schema(T::NAME, reason))?;

    Ok(value)
}
