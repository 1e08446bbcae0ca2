// Файл: core/mod.rs
// Общая инфраструктура: ошибки, HTTP-сессия, JSON и параметры запросов.

pub mod error;
pub mod http;
pub mod json;
pub mod params;

pub use error::{CoreError, RequestParam, VkApiError, VkError};
pub use http::{mask_secret, Endpoints, HttpSession, DEFAULT_TIMEOUT_SECS};
pub use params::{ParamValue, Params};
