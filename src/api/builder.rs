// Файл: api/builder.rs
// Сборка `Api`: настройки, учетные данные и авторизация при создании.

use super::requests::Api;
use super::session::Session;
use crate::auth::{AccessToken, AuthApi, Credentials, Scope};
use crate::core::{Endpoints, HttpSession, ParamValue, Params, VkError, DEFAULT_TIMEOUT_SECS};
use crate::settings::Settings;
use std::time::Duration;

/// Настраивает [`Api`]. При наличии учетных данных `build` сразу авторизуется.
#[derive(Default)]
pub struct ApiBuilder {
    app_id: Option<String>,
    login: Option<String>,
    password: Option<String>,
    phone_number: Option<String>,
    two_fa_code: Option<String>,
    scope: Option<Scope>,
    api_version: Option<String>,
    access_token: Option<String>,
    client_secret: Option<String>,
    timeout: Option<Duration>,
    default_params: Params,
    endpoints: Option<Endpoints>,
}

impl ApiBuilder {
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    pub fn two_fa_code(mut self, code: impl Into<String>) -> Self {
        self.two_fa_code = Some(code.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Пользовательский или сервисный токен, полученный заранее.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Отправляется с каждым вызовом, если вызов не задал его сам, например `lang`.
    pub fn default_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.default_params.insert(name, value);
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Все, что есть в `Settings`; отсутствующие значения не трогают уже заданные.
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.app_id = settings.app_id.clone().or(self.app_id);
        self.login = settings.login.clone().or(self.login);
        self.password = settings.password.clone().or(self.password);
        self.phone_number = settings.phone_number.clone().or(self.phone_number);
        self.access_token = settings.service_token.clone().or(self.access_token);
        self.client_secret = settings.client_secret.clone().or(self.client_secret);
        self.api_version = settings.api_version.clone().or(self.api_version);
        self.scope = settings.scope.clone().or(self.scope);
        self.timeout = settings.timeout.or(self.timeout);
        self
    }

    pub async fn build(self) -> Result<Api, VkError> {
        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let http = HttpSession::new(timeout)?;
        let endpoints = self.endpoints.unwrap_or_default();

        let mut auth_api = AuthApi::new(endpoints.clone());
        if let Some(app_id) = self.app_id {
            auth_api = auth_api.with_app_id(app_id);
        }
        if let Some(scope) = self.scope {
            auth_api = auth_api.with_scope(scope);
        }
        if let Some(version) = self.api_version {
            auth_api = auth_api.with_api_version(version);
        }
        if let Some(secret) = self.client_secret {
            auth_api = auth_api.with_client_secret(secret);
        }
        if let Some(token) = self.access_token {
            auth_api = auth_api.with_access_token(AccessToken::new(token));
        }
        match (self.login, self.password) {
            (Some(login), Some(password)) => {
                let mut credentials = Credentials::new(login, password);
                credentials.phone_number = self.phone_number;
                credentials.two_fa_code = self.two_fa_code;
                auth_api = auth_api.with_credentials(credentials);
            }
            (None, None) => {}
            _ => {
                return Err(VkError::InvalidParam(
                    "login and password must be given together".into(),
                ))
            }
        }

        let session = Session::new(http, auth_api, endpoints, self.default_params);
        if session.auth_api().can_reauthorize() {
            session.auth_api().authorize(session.http()).await?;
        }
        Ok(Api::from_session(session))
    }
}
