// Файл: auth/mod.rs
// Авторизация: модели, разбор HTML и сценарии получения токена.

pub mod html;
pub mod models;
pub mod requests;

pub use models::{AccessToken, Credentials, Scope, DEFAULT_API_VERSION};
pub use requests::AuthApi;
