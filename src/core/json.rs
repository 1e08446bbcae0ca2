// Файл: core/json.rs
// Общие хелперы для разбора JSON.

use super::error::CoreError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Разбирает сырое тело ответа.
/// `context` попадает только в строку лога (например, имя метода VK).
pub fn parse_json_from_text<T: for<'de> Deserialize<'de>>(
    response_text: &str,
    context: &str,
) -> Result<T, CoreError> {
    serde_json::from_str(response_text).map_err(|e| {
        log::warn!("Failed to parse JSON for {}: {}", context, e);
        CoreError::from(e)
    })
}

// VK непоследователен с идентификаторами: одно и то же поле приходит строкой или числом.
fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

pub(crate) fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}
