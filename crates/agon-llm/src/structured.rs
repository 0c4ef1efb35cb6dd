//! Schema-constrained generation helpers

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::provider::{LlmError, LlmProvider, LlmRequest};

/// Find the outermost JSON object or array in free text.
///
/// Models often wrap JSON in prose or code fences.
pub fn extract_json(text: &str) -> &str {
    let object = text.find('{').zip(text.rfind('}'));
    let array = text.find('[').zip(text.rfind(']'));

    let span = match (object, array) {
        (Some(o), Some(a)) => {
            if a.0 < o.0 {
                Some(a)
            } else {
                Some(o)
            }
        }
        (Some(o), None) => Some(o),
        (None, Some(a)) => Some(a),
        (None, None) => None,
    };

    match span {
        Some((start, end)) if start <= end => &text[start..=end],
        _ => text,
    }
}

/// Parse the JSON embedded in `text` and validate it against `schema`
pub fn parse_and_validate(text: &str, schema: &Value) -> Result<Value, LlmError> {
    let value: Value = serde_json::from_str(extract_json(text))
        .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

    let validator = jsonschema::validator_for(schema)
        .map_err(|e| LlmError::SchemaViolation(format!("invalid schema: {}", e)))?;
    let errors: Vec<String> = validator.iter_errors(&value).map(|e| e.to_string()).collect();
    if !errors.is_empty() {
        return Err(LlmError::SchemaViolation(errors.join("; ")));
    }
    Ok(value)
}

/// Structured generation deserialized into `T`
pub async fn generate_structured<T, L>(
    llm: &L,
    request: LlmRequest,
    schema: &Value,
) -> Result<T, LlmError>
where
    T: DeserializeOwned,
    L: LlmProvider + ?Sized,
{
    let value = llm.complete_structured(request, schema).await?;
    serde_json::from_value(value).map_err(|e| LlmError::InvalidResponse(e.to_string()))
}
