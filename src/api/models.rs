// Файл: api/models.rs
// Конверт ответа и несколько типовых структур VK для `send_as`.

use crate::core::VkApiError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Тело любого ответа `api.vk.com/method/...`.
#[derive(Debug, Deserialize)]
pub(crate) struct ResponseEnvelope {
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub error: Option<VkApiError>,
    /// Ошибки отдельных вызовов внутри скрипта `execute`.
    #[serde(default)]
    pub execute_errors: Vec<VkApiError>,
}

/// Ответ на капчу (ошибка 14), отправляется вместе с повторным вызовом.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captcha {
    pub sid: String,
    pub key: String,
}

/// `{"count": N, "items": [...]}`, формат большинства списочных методов.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemList<T> {
    pub count: i64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub screen_name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    /// `deleted` или `banned`; такие профили приходят без запрошенных полей.
    #[serde(default)]
    pub deactivated: Option<String>,
    /// Остальные запрошенные `fields`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Status {
    pub text: String,
}
