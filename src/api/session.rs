// Файл: api/session.rs
// Подписывает вызовы методов, отправляет их и разбирает конверт ответа.

use super::models::{Captcha, ResponseEnvelope};
use crate::auth::{AccessToken, AuthApi};
use crate::core::{json, Endpoints, HttpSession, Params, VkError};
use log::{debug, info, warn};
use serde_json::Value;
use url::Url;

#[derive(Debug)]
pub struct Session {
    http: HttpSession,
    auth_api: AuthApi,
    endpoints: Endpoints,
    default_params: Params,
}

impl Session {
    pub fn new(
        http: HttpSession,
        auth_api: AuthApi,
        endpoints: Endpoints,
        default_params: Params,
    ) -> Self {
        Self {
            http,
            auth_api,
            endpoints,
            default_params,
        }
    }

    pub fn auth_api(&self) -> &AuthApi {
        &self.auth_api
    }

    pub fn http(&self) -> &HttpSession {
        &self.http
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Параметры, отправляемые с каждым вызовом (например, `lang`).
    pub fn default_params(&self) -> &Params {
        &self.default_params
    }

    /// Вызывает `method_name` и возвращает поле `response`.
    ///
    /// Истекший токен заменяется до вызова. Если VK отклонил токен,
    /// а сессия может получить новый, вызов повторяется один раз
    /// с новым токеном.
    pub async fn make_request(
        &self,
        method_name: &str,
        params: &Params,
        captcha: Option<&Captcha>,
    ) -> Result<Value, VkError> {
        let url = self.endpoints.method_url(method_name)?;
        self.refresh_expired_token().await?;

        match self.send_api_request(url.clone(), method_name, params, captcha).await {
            Err(VkError::Api(err))
                if err.is_access_token_incorrect() && self.auth_api.can_reauthorize() =>
            {
                warn!("VK rejected the access token on {}, authorizing again", method_name);
                self.auth_api.invalidate().await;
                self.auth_api.authorize(&self.http).await?;
                self.send_api_request(url, method_name, params, captcha).await
            }
            other => other,
        }
    }

    async fn refresh_expired_token(&self) -> Result<(), VkError> {
        let expired = self
            .auth_api
            .access_token()
            .await
            .is_some_and(|token| token.is_expired());
        if expired && self.auth_api.can_reauthorize() {
            info!("Held access token has expired, authorizing again");
            self.auth_api.invalidate().await;
            self.auth_api.authorize(&self.http).await?;
        }
        Ok(())
    }

    async fn send_api_request(
        &self,
        url: Url,
        method_name: &str,
        params: &Params,
        captcha: Option<&Captcha>,
    ) -> Result<Value, VkError> {
        let token = self.auth_api.access_token().await;
        let form = self.build_form(params, token.as_ref(), captcha);

        debug!(
            "Calling {} with params {:?} (token: {})",
            method_name,
            params.names(),
            token.is_some()
        );

        let text = self
            .http
            .post_form(url, &form)
            .await?
            .error_for_status()?
            .text()
            .await?;
        let envelope: ResponseEnvelope = json::parse_json_from_text(&text, method_name)?;

        for err in &envelope.execute_errors {
            warn!(
                "execute sub-call {} failed: {}",
                err.method.as_deref().unwrap_or("?"),
                err
            );
        }

        match envelope {
            ResponseEnvelope {
                error: Some(err), ..
            } => {
                debug!("{} returned error {}", method_name, err.code);
                Err(VkError::Api(err))
            }
            ResponseEnvelope { response, .. } => Ok(response.unwrap_or(Value::Null)),
        }
    }

    /// Тело формы: `v`, затем параметры по умолчанию, затем параметры вызова
    /// (они главнее), затем токен и ответ на капчу.
    pub(crate) fn build_form(
        &self,
        params: &Params,
        token: Option<&AccessToken>,
        captcha: Option<&Captcha>,
    ) -> Vec<(String, String)> {
        let mut merged = Params::new();
        merged.insert("v", self.auth_api.api_version());
        merged.merge(&self.default_params);
        merged.merge(params);

        if let Some(token) = token {
            merged.insert("access_token", token.as_str());
        }
        if let Some(captcha) = captcha {
            merged.insert("captcha_sid", captcha.sid.as_str());
            merged.insert("captcha_key", captcha.key.as_str());
        }
        merged.to_form()
    }
}
