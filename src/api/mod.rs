// Файл: api/mod.rs
// Вызовы методов VK: построитель, сессия и адресация по имени.

pub mod builder;
pub mod models;
pub mod requests;
pub mod session;

pub use builder::ApiBuilder;
pub use models::{Captcha, ItemList, Status, User};
pub use requests::{Api, MethodRequest, Namespace};
pub use session::Session;
