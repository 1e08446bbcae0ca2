// Файл: settings.rs
// Конфигурация из переменных окружения (учитывается файл `.env`).

use crate::auth::Scope;
use crate::core::mask_secret;
use std::fmt;
use std::time::Duration;

/// Значения из переменных окружения `VK_*`. Незаданные или пустые переменные дают `None`.
#[derive(Clone)]
pub struct Settings {
    pub app_id: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub service_token: Option<String>,
    pub client_secret: Option<String>,
    pub api_version: Option<String>,
    pub scope: Option<Scope>,
    /// `VK_TIMEOUT_SECS`; `None` оставляет таймаут клиента по умолчанию.
    pub timeout: Option<Duration>,
}

impl Settings {
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Ignoring unreadable .env file: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = get("VK_TIMEOUT_SECS")
            .and_then(|v| match v.trim().parse::<u64>() {
                Ok(secs) => Some(secs),
                Err(_) => {
                    log::warn!("VK_TIMEOUT_SECS={:?} is not a number, using the default", v);
                    None
                }
            })
            .map(Duration::from_secs);

        Self {
            app_id: get("VK_APP_ID"),
            login: get("VK_USER_LOGIN"),
            password: get("VK_USER_PASSWORD"),
            phone_number: get("VK_PHONE_NUMBER"),
            service_token: get("VK_SERVICE_TOKEN"),
            client_secret: get("VK_CLIENT_SECRET"),
            api_version: get("VK_API_VERSION"),
            scope: get("VK_SCOPE").map(|s| Scope::from(s.as_str())),
            timeout,
        }
    }

    pub fn has_user_credentials(&self) -> bool {
        self.app_id.is_some() && self.login.is_some() && self.password.is_some()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hidden = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Settings")
            .field("app_id", &self.app_id)
            .field("login", &self.login)
            .field("password", &hidden(&self.password))
            .field("phone_number", &self.phone_number.as_deref().map(mask_secret))
            .field("service_token", &hidden(&self.service_token))
            .field("client_secret", &hidden(&self.client_secret))
            .field("api_version", &self.api_version)
            .field("scope", &self.scope)
            .field("timeout", &self.timeout)
            .finish()
    }
}
