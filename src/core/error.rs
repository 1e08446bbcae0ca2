// Файл: core/error.rs
// Типы ошибок: CoreError внутри HTTP/JSON-хелперов, VkError на публичной границе.

use super::json::{lenient_opt_string, lenient_string};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

// --- 1. Внутренняя ошибка (CoreError) ---
// Возвращается хелперами из `core`.

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Failed to parse JSON response or payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid request parameter: {0}")]
    InvalidParam(String),
}

// --- 2. Ошибка из ответа VK (VkApiError) ---

/// Пара `{"key": ..., "value": ...}`, которую VK возвращает вместе с ошибкой.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestParam {
    #[serde(deserialize_with = "lenient_string")]
    pub key: String,
    #[serde(deserialize_with = "lenient_string")]
    pub value: String,
}

/// Поле `error` ответа VK.
///
/// Сюда попадает любой неуспешный ответ API, независимо от причины
/// (нет токена, не хватает прав, капча, flood control...).
#[derive(Debug, Clone, Error, Deserialize)]
#[error("VK API error {code}: {message}")]
pub struct VkApiError {
    #[serde(rename = "error_code")]
    pub code: i64,
    #[serde(rename = "error_msg", default)]
    pub message: String,
    #[serde(default)]
    pub request_params: Vec<RequestParam>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub captcha_sid: Option<String>,
    #[serde(default)]
    pub captcha_img: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// Заполнено у ошибок вложенных вызовов `execute`.
    #[serde(default)]
    pub method: Option<String>,
}

impl VkApiError {
    pub const USER_AUTHORIZATION_FAILED: i64 = 5;
    pub const TOO_MANY_REQUESTS: i64 = 6;
    pub const PERMISSION_DENIED: i64 = 7;
    pub const CAPTCHA_NEEDED: i64 = 14;
    pub const ACCESS_DENIED: i64 = 15;
    pub const INVALID_USER_ID: i64 = 113;

    /// Токен был выдан, но VK его больше не принимает.
    pub fn is_access_token_incorrect(&self) -> bool {
        self.code == Self::USER_AUTHORIZATION_FAILED
            && self.message.contains("invalid access_token")
    }

    pub fn is_captcha_needed(&self) -> bool {
        self.code == Self::CAPTCHA_NEEDED
    }

    pub fn is_access_denied(&self) -> bool {
        self.code == Self::ACCESS_DENIED
    }

    pub fn is_too_many_requests(&self) -> bool {
        self.code == Self::TOO_MANY_REQUESTS
    }

    pub fn is_permission_denied(&self) -> bool {
        self.code == Self::PERMISSION_DENIED
    }

    /// Ищет параметр, который VK вернул вместе с ошибкой.
    pub fn request_param(&self, key: &str) -> Option<&str> {
        self.request_params
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

// --- 3. Публичная ошибка (VkError) ---

#[derive(Debug, Error)]
pub enum VkError {
    /// Ошибка, которую вернул API.
    #[error(transparent)]
    Api(#[from] VkApiError),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("VK page reported warnings: {0}")]
    PageWarnings(String),

    /// Сбои транспорта и статусы не 2xx, в том виде, в каком их сообщает reqwest.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to parse URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid request parameter: {0}")]
    InvalidParam(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl VkError {
    pub(crate) fn auth(message: impl fmt::Display) -> Self {
        VkError::Auth(message.to_string())
    }

    /// Ошибка VK, если это она.
    pub fn as_api_error(&self) -> Option<&VkApiError> {
        match self {
            VkError::Api(e) => Some(e),
            _ => None,
        }
    }
}

// --- 4. Мост (CoreError -> VkError) ---

impl From<CoreError> for VkError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network(e) => VkError::Transport(e),
            CoreError::UrlParse(e) => VkError::UrlParse(e),
            CoreError::Parse(e) => VkError::Parse(e),
            CoreError::InvalidParam(msg) => VkError::InvalidParam(msg),
        }
    }
}
