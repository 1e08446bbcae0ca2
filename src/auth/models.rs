// Файл: auth/models.rs
// Типы токена, прав доступа и учетных данных.

use crate::core::mask_secret;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_API_VERSION: &str = "5.92";

// --- Права доступа (Scope) ---

/// Права, запрашиваемые для пользовательского токена, например `["offline", "status"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope(Vec<String>);

impl Scope {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scope(
            names
                .into_iter()
                .map(Into::into)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|s| s == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope(vec!["offline".to_string()])
    }
}

/// Формат передачи: имена через запятую.
impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Scope::new(s.split(','))
    }
}

impl From<Vec<String>> for Scope {
    fn from(v: Vec<String>) -> Self {
        Scope::new(v)
    }
}

impl From<Vec<&str>> for Scope {
    fn from(v: Vec<&str>) -> Self {
        Scope::new(v)
    }
}

impl<const N: usize> From<[&str; N]> for Scope {
    fn from(v: [&str; N]) -> Self {
        Scope::new(v)
    }
}

// --- Токен (AccessToken) ---

/// Токен, выданный VK. Непрозрачен; `Debug` никогда не печатает его целиком.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_in: Option<u64>,
    user_id: Option<i64>,
    obtained_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_in: None,
            user_id: None,
            obtained_at: Utc::now(),
        }
    }

    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Время жизни в секундах по данным VK; `0` значит бессрочный токен (право `offline`).
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    /// Время выдачи токена, полученного ранее, например восстановленного из хранилища.
    pub fn with_obtained_at(mut self, obtained_at: DateTime<Utc>) -> Self {
        self.obtained_at = obtained_at;
        self
    }

    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    /// Момент, когда токен перестает действовать; `None`, если он бессрочный
    /// или указанное время жизни выходит за допустимый диапазон.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.expires_in.filter(|&secs| secs > 0)?;
        let lifetime = Duration::try_seconds(i64::try_from(secs).ok()?)?;
        self.obtained_at.checked_add_signed(lifetime)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at().is_some_and(|at| at <= Utc::now())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &mask_secret(&self.value))
            .field("expires_in", &self.expires_in)
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl PartialEq<&str> for AccessToken {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

// --- Учетные данные (Credentials) ---

/// Логин и пароль для входа по паролю.
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    password: String,
    /// Полный номер телефона; нужен, когда VK просит подтвердить скрытый номер.
    pub phone_number: Option<String>,
    /// Код для аккаунтов с двухфакторной аутентификацией.
    pub two_fa_code: Option<String>,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            phone_number: None,
            two_fa_code: None,
        }
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    pub fn with_two_fa_code(mut self, code: impl Into<String>) -> Self {
        self.two_fa_code = Some(code.into());
        self
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .field("phone_number", &self.phone_number.as_deref().map(mask_secret))
            .field("two_fa_code", &self.two_fa_code.as_ref().map(|_| "***"))
            .finish()
    }
}

// --- Ответы OAuth ---

/// Ответ `oauth.vk.com/access_token`.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}
