// Файл: auth/requests.rs
// Получение токена: готовый токен, вход по паролю + implicit OAuth, client credentials.

use super::html;
use super::models::{AccessToken, Credentials, Scope, TokenResponse, DEFAULT_API_VERSION};
use crate::core::{Endpoints, HttpSession, VkError};
use log::{debug, info, warn};
use tokio::sync::RwLock;
use url::Url;

/// Получает и хранит токен, которым подписываются вызовы API.
#[derive(Debug)]
pub struct AuthApi {
    app_id: Option<String>,
    credentials: Option<Credentials>,
    client_secret: Option<String>,
    scope: Scope,
    api_version: String,
    endpoints: Endpoints,
    token: RwLock<Option<AccessToken>>,
}

impl AuthApi {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            app_id: None,
            credentials: None,
            client_secret: None,
            scope: Scope::default(),
            api_version: DEFAULT_API_VERSION.to_string(),
            endpoints,
            token: RwLock::new(None),
        }
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Токен, выданный заранее (пользовательский или сервисный); используется как есть.
    pub fn with_access_token(self, token: AccessToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
            ..self
        }
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub async fn access_token(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    /// Можно ли получить новый токен без участия пользователя.
    pub fn can_reauthorize(&self) -> bool {
        self.credentials.is_some() || (self.app_id.is_some() && self.client_secret.is_some())
    }

    /// Сбрасывает текущий токен, например после отказа VK.
    pub async fn invalidate(&self) {
        if self.token.write().await.take().is_some() {
            debug!("Access token dropped");
        }
    }

    /// Получает токен (если его еще нет) и сохраняет его.
    pub async fn authorize(&self, http: &HttpSession) -> Result<Option<AccessToken>, VkError> {
        let token = self.get_access_token(http).await?;
        *self.token.write().await = token.clone();
        Ok(token)
    }

    /// Выбирает первый подходящий сценарий: имеющийся токен, вход по паролю,
    /// client credentials. `None` означает анонимный доступ.
    pub async fn get_access_token(&self, http: &HttpSession) -> Result<Option<AccessToken>, VkError> {
        if let Some(token) = self.token.read().await.clone() {
            if !token.is_expired() {
                return Ok(Some(token));
            }
            info!("Held access token has expired, requesting a new one");
        }

        if let Some(credentials) = &self.credentials {
            self.do_login(http, credentials).await?;
            let token = self.do_implicit_flow_authorization(http).await?;
            info!("Obtained user access token for {}", credentials.login);
            return Ok(Some(token));
        }

        if let (Some(app_id), Some(secret)) = (&self.app_id, &self.client_secret) {
            let token = self.do_client_credentials(http, app_id, secret).await?;
            info!("Obtained service access token for app {}", app_id);
            return Ok(Some(token));
        }

        debug!("No credentials configured, API stays anonymous");
        Ok(None)
    }

    // ## Вход по паролю ##

    fn logged_in(&self, http: &HttpSession, url: &Url) -> bool {
        http.has_cookie(url, "remixsid") || http.has_cookie(url, "remixsid6")
    }

    async fn do_login(&self, http: &HttpSession, credentials: &Credentials) -> Result<(), VkError> {
        let login_url = self.endpoints.login.clone();
        let page = http.get(login_url.clone()).await?.error_for_status()?;
        let page_url = page.url().clone();
        let html = page.text().await?;

        let action = html::parse_form_action_url(&html)
            .ok_or_else(|| VkError::auth("login form not found on the login page"))?;
        let action_url = page_url.join(&action)?;

        let form = [
            ("email", credentials.login.as_str()),
            ("pass", credentials.password()),
        ];
        let response = http.post_form(action_url, &form).await?.error_for_status()?;
        if self.logged_in(http, &login_url) || self.logged_in(http, response.url()) {
            debug!("Login accepted for {}", credentials.login);
            return Ok(());
        }

        let final_url = response.url().clone();
        let html = response.text().await?;
        let params = html::parse_url_query_params(&final_url, false);

        if params.contains_key("sid") {
            warn!("VK asked for a captcha during login");
            return Err(VkError::auth("captcha is required to log in"));
        }
        match params.get("act").map(String::as_str) {
            Some("authcheck") => {
                self.pass_two_factor_check(http, credentials, &final_url, &html)
                    .await?
            }
            Some("security_check") => {
                self.pass_security_check(http, credentials, &final_url, &html)
                    .await?
            }
            _ if params.contains_key("security_check") => {
                self.pass_security_check(http, credentials, &final_url, &html)
                    .await?
            }
            _ => {
                html::check_html_warnings(&html)?;
                return Err(VkError::auth("login failed, check login and password"));
            }
        }

        if self.logged_in(http, &login_url) || self.logged_in(http, &final_url) {
            Ok(())
        } else {
            Err(VkError::auth("login was not confirmed by VK"))
        }
    }

    async fn pass_two_factor_check(
        &self,
        http: &HttpSession,
        credentials: &Credentials,
        page_url: &Url,
        html: &str,
    ) -> Result<(), VkError> {
        debug!("Two-factor check requested");
        let code = credentials
            .two_fa_code
            .as_deref()
            .ok_or_else(|| VkError::auth("two-factor authentication code is required"))?;
        let action = html::parse_form_action_url(html)
            .ok_or_else(|| VkError::auth("two-factor form not found"))?;

        let form = [("code", code), ("_ajax", "1"), ("remember", "1")];
        http.post_form(page_url.join(&action)?, &form)
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn pass_security_check(
        &self,
        http: &HttpSession,
        credentials: &Credentials,
        page_url: &Url,
        html: &str,
    ) -> Result<(), VkError> {
        debug!("Phone number confirmation requested");
        let phone_number = credentials
            .phone_number
            .as_deref()
            .ok_or_else(|| VkError::auth("phone number is required to pass the security check"))?;
        let (prefix, suffix) = html::parse_masked_phone_number(html)?;
        let code = html::check_phone_number(phone_number, &prefix, &suffix)?;
        let action = html::parse_form_action_url(html)
            .ok_or_else(|| VkError::auth("security check form not found"))?;

        http.post_form(page_url.join(&action)?, &[("code", code.as_str())])
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn do_implicit_flow_authorization(&self, http: &HttpSession) -> Result<AccessToken, VkError> {
        let app_id = self
            .app_id
            .as_deref()
            .ok_or_else(|| VkError::auth("app_id is required for the implicit flow"))?;

        let scope = self.scope.to_string();
        let form = [
            ("client_id", app_id),
            ("display", "mobile"),
            ("response_type", "token"),
            ("scope", scope.as_str()),
            ("redirect_uri", self.endpoints.redirect_uri.as_str()),
            ("v", self.api_version.as_str()),
        ];
        let response = http
            .post_form(self.endpoints.authorize.clone(), &form)
            .await?
            .error_for_status()?;

        let final_url = response.url().clone();
        if let Some(token) = token_from_redirect(&final_url)? {
            return Ok(token);
        }

        // Редиректа нет: VK показывает страницу подтверждения доступа.
        let html = response.text().await?;
        html::check_html_warnings(&html)?;
        let action = html::parse_form_action_url(&html)
            .ok_or_else(|| VkError::auth("no access token and no consent form in the OAuth reply"))?;

        debug!("Granting access on the consent page");
        let response = http.get(final_url.join(&action)?).await?.error_for_status()?;
        token_from_redirect(response.url())?
            .ok_or_else(|| VkError::auth("OAuth redirect carried no access token"))
    }

    // ## Client credentials ##

    async fn do_client_credentials(
        &self,
        http: &HttpSession,
        app_id: &str,
        secret: &str,
    ) -> Result<AccessToken, VkError> {
        let url = Url::parse_with_params(
            self.endpoints.access_token.as_str(),
            &[
                ("client_id", app_id),
                ("client_secret", secret),
                ("v", self.api_version.as_str()),
                ("grant_type", "client_credentials"),
            ],
        )?;

        let reply: TokenResponse = http.fetch_json(url).await?;
        match reply {
            TokenResponse {
                access_token: Some(value),
                expires_in,
                user_id,
                ..
            } => {
                let mut token = AccessToken::new(value);
                if let Some(secs) = expires_in {
                    token = token.with_expires_in(secs);
                }
                if let Some(id) = user_id {
                    token = token.with_user_id(id);
                }
                Ok(token)
            }
            TokenResponse {
                error,
                error_description,
                ..
            } => Err(VkError::auth(format!(
                "{}: {}",
                error.unwrap_or_else(|| "unknown_error".into()),
                error_description.unwrap_or_default()
            ))),
        }
    }
}

/// Токен из URL редиректа OAuth, `error` оттуда же или `None`, если
/// в URL нет ни того, ни другого.
fn token_from_redirect(url: &Url) -> Result<Option<AccessToken>, VkError> {
    let mut params = html::parse_url_query_params(url, false);
    params.extend(html::parse_url_query_params(url, true));

    if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .map(String::as_str)
            .unwrap_or_default();
        return Err(VkError::auth(format!("{}: {}", error, description)));
    }

    let Some(value) = params.get("access_token") else {
        return Ok(None);
    };
    let mut token = AccessToken::new(value.as_str());
    if let Some(secs) = params.get("expires_in").and_then(|v| v.parse().ok()) {
        token = token.with_expires_in(secs);
    }
    if let Some(id) = params.get("user_id").and_then(|v| v.parse().ok()) {
        token = token.with_user_id(id);
    }
    Ok(Some(token))
}
