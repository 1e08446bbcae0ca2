// Файл: lib.rs
// Корень крейта: реэкспорты, фабрики `Api` и инициализация логгера.

//! Клиент HTTP API VK.
//!
//! Методы адресуются по имени через точку и отправляются подписанными
//! запросами-формами на `https://api.vk.com/method/<name>`:
//!
//! ```no_run
//! # async fn demo() -> Result<(), vk_requests::VkError> {
//! let api = vk_requests::Api::builder()
//!     .app_id("1234567")
//!     .login("user@example.com")
//!     .password("secret")
//!     .scope(["offline", "status"])
//!     .build()
//!     .await?;
//!
//! api.namespace("status").method("set").param("text", "hello").send().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod settings;

pub use crate::api::{Api, ApiBuilder, MethodRequest, Namespace};
pub use crate::auth::{AccessToken, Scope, DEFAULT_API_VERSION};
pub use crate::core::{ParamValue, Params, VkApiError, VkError};
pub use crate::settings::Settings;

/// Анонимный API с настройками по умолчанию; достаточно для публичных методов.
pub async fn create_api() -> Result<Api, VkError> {
    Api::builder().build().await
}

/// API, настроенный из переменных окружения `VK_*` (см. [`Settings`]).
pub async fn create_api_from_settings(settings: &Settings) -> Result<Api, VkError> {
    Api::builder().settings(settings).build().await
}

/// Подключает `env_logger`; повторные вызовы ничего не делают.
pub fn init_logger() {
    let _ = env_logger::try_init();
}
