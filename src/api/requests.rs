// Файл: api/requests.rs
// Адресация методов по имени: `api.namespace("users").method("get")` -> `users.get`.

use super::builder::ApiBuilder;
use super::models::Captcha;
use super::session::Session;
use crate::auth::AccessToken;
use crate::core::{ParamValue, Params, VkError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Точка входа: отсюда по имени доступен любой метод VK.
///
/// ```no_run
/// # async fn demo() -> Result<(), vk_requests::VkError> {
/// let api = vk_requests::Api::builder().default_param("lang", "ru").build().await?;
/// let profiles = api.namespace("users").method("get").param("user_id", 1).send().await?;
/// println!("{}", profiles[0]["last_name"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Api {
    session: Session,
}

impl Api {
    pub fn builder() -> ApiBuilder {
        ApiBuilder::default()
    }

    pub(crate) fn from_session(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn access_token(&self) -> Option<AccessToken> {
        self.session.auth_api().access_token().await
    }

    /// Вызов метода по полному имени через точку, например `"users.get"`.
    pub fn method(&self, name: impl Into<String>) -> MethodRequest<'_> {
        MethodRequest::new(self, name.into())
    }

    pub fn namespace(&self, name: impl Into<String>) -> Namespace<'_> {
        Namespace {
            api: self,
            path: name.into(),
        }
    }

    /// Текущее время сервера через `getServerTime`.
    pub async fn server_time(&self) -> Result<DateTime<Utc>, VkError> {
        let secs: i64 = self.method("getServerTime").send_as().await?;
        DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            VkError::UnexpectedResponse(format!("server time {} is out of range", secs))
        })
    }

    /// Выполняет фрагмент VKScript через `execute`.
    pub async fn execute(&self, code: &str) -> Result<Value, VkError> {
        self.method("execute").param("code", code).send().await
    }
}

/// Префикс имени метода, например `users` или `execute`.
#[derive(Debug, Clone)]
pub struct Namespace<'a> {
    api: &'a Api,
    path: String,
}

impl<'a> Namespace<'a> {
    pub fn name(&self) -> &str {
        &self.path
    }

    pub fn method(&self, name: &str) -> MethodRequest<'a> {
        MethodRequest::new(self.api, format!("{}.{}", self.path, name))
    }

    pub fn namespace(&self, name: &str) -> Namespace<'a> {
        Namespace {
            api: self.api,
            path: format!("{}.{}", self.path, name),
        }
    }
}

/// Собираемый вызов метода. Его можно отправить несколько раз, например
/// повторно с ответом на капчу после ошибки 14.
#[derive(Debug, Clone)]
pub struct MethodRequest<'a> {
    api: &'a Api,
    name: String,
    params: Params,
    captcha: Option<Captcha>,
}

impl<'a> MethodRequest<'a> {
    fn new(api: &'a Api, name: String) -> Self {
        Self {
            api,
            name,
            params: Params::new(),
            captcha: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name, value);
        self
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.params.extend(params);
        self
    }

    /// Версия API только для этого вызова.
    pub fn version(self, version: impl Into<String>) -> Self {
        self.param("v", version.into())
    }

    pub fn captcha(mut self, sid: impl Into<String>, key: impl Into<String>) -> Self {
        self.captcha = Some(Captcha {
            sid: sid.into(),
            key: key.into(),
        });
        self
    }

    pub async fn send(&self) -> Result<Value, VkError> {
        self.api
            .session
            .make_request(&self.name, &self.params, self.captcha.as_ref())
            .await
    }

    /// Как `send`, но десериализует поле `response` в `T`.
    pub async fn send_as<T: DeserializeOwned>(&self) -> Result<T, VkError> {
        let value = self.send().await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{ItemList, Status, User};
    use crate::auth::DEFAULT_API_VERSION;
    use crate::core::Endpoints;
    use url::Url;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_api(server: &MockServer) -> ApiBuilder {
        let _ = env_logger::builder().is_test(true).try_init();
        let endpoints = Endpoints::with_base(&Url::parse(&server.uri()).unwrap()).unwrap();
        Api::builder().endpoints(endpoints)
    }

    fn reply(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "application/json; charset=utf-8")
            .set_body_string(body)
    }

    #[tokio::test]
    async fn test_namespace_and_method_address_same_endpoint() {
        let server = MockServer::start().await;
        let api = mock_api(&server).await.build().await.unwrap();

        assert_eq!(api.namespace("users").method("get").name(), "users.get");
        assert_eq!(api.method("users.get").name(), "users.get");
        assert_eq!(
            api.namespace("execute").method("wallMultiGet").name(),
            "execute.wallMultiGet"
        );
        assert_eq!(api.namespace("a").namespace("b").method("c").name(), "a.b.c");
    }

    #[tokio::test]
    async fn test_default_api_version_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/method/users.get"))
            .and(body_string_contains(format!("v={}", DEFAULT_API_VERSION)))
            .and(body_string_contains("user_id=1"))
            .respond_with(reply(r#"{"response":[{"id":1,"first_name":"Pavel","last_name":"Durov"}]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let api = mock_api(&server).await.build().await.unwrap();
        assert!(api.access_token().await.is_none());

        let users: Vec<User> = api
            .namespace("users")
            .method("get")
            .param("user_id", 1)
            .send_as()
            .await
            .unwrap();
        assert_eq!(users[0].last_name, "Durov");
    }

    #[tokio::test]
    async fn test_custom_and_per_request_api_version() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/method/users.get"))
            .and(body_string_contains("v=3.00"))
            .respond_with(reply(r#"{"response":[]}"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/method/users.get"))
            .and(body_string_contains("v=5.8"))
            .respond_with(reply(r#"{"response":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let api = mock_api(&server).await.api_version("3.00").build().await.unwrap();
        assert_eq!(api.session().auth_api().api_version(), "3.00");

        api.method("users.get").param("user_id", 1).send().await.unwrap();
        api.method("users.get")
            .param("user_id", 1)
            .version("5.8")
            .send()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_default_params_are_merged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/method/friends.get"))
            .and(body_string_contains("lang=ru"))
            .and(body_string_contains("fields=nickname%2Ccity%2Ccan_see_all_posts"))
            .respond_with(reply(
                r#"{"response":{"count":1,"items":[{"id":5,"first_name":"Ilya","last_name":"Perekopsky","nickname":"","can_see_all_posts":1}]}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let api = mock_api(&server)
            .await
            .default_param("lang", "ru")
            .build()
            .await
            .unwrap();
        let friends: ItemList<User> = api
            .namespace("friends")
            .method("get")
            .param("user_id", 1)
            .param("fields", vec!["nickname", "city", "can_see_all_posts"])
            .send_as()
            .await
            .unwrap();
        assert_eq!(friends.count, 1);
        assert!(friends.items[0].nickname.is_some());
        assert!(friends.items[0].extra.contains_key("can_see_all_posts"));
    }

    #[tokio::test]
    async fn test_token_only_method_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/method/users.search"))
            .respond_with(reply(
                r#"{"error":{"error_code":5,"error_msg":"User authorization failed: no access_token passed.","request_params":[{"key":"method","value":"users.search"}]}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let api = mock_api(&server).await.build().await.unwrap();
        let err = api
            .namespace("users")
            .method("search")
            .with_params([("city", 2), ("age_from", 18), ("age_to", 50), ("count", 1000)])
            .send()
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no access_token passed"));
        let api_err = err.as_api_error().unwrap();
        assert_eq!(api_err.code, 5);
        assert_eq!(api_err.request_param("method"), Some("users.search"));
    }

    #[tokio::test]
    async fn test_token_signs_requests_and_status_roundtrip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/method/status.set"))
            .and(body_string_contains("access_token=preset-token"))
            .and(body_string_contains("text=Welcome"))
            .respond_with(reply(r#"{"response":1}"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/method/status.get"))
            .and(body_string_contains("access_token=preset-token"))
            .respond_with(reply(r#"{"response":{"text":"Welcome"}}"#))
            .expect(1)
            .mount(&server)
            .await;

        let api = mock_api(&server)
            .await
            .access_token("preset-token")
            .scope(["offline", "status"])
            .build()
            .await
            .unwrap();
        assert_eq!(api.session().auth_api().scope().as_slice(), ["offline", "status"]);

        let status = api.namespace("status");
        let resp = status.method("set").param("text", "Welcome").send().await.unwrap();
        assert_eq!(resp, Value::from(1));

        let current: Status = status.method("get").send_as().await.unwrap();
        assert_eq!(current.text, "Welcome");
    }

    #[tokio::test]
    async fn test_captcha_answer_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/method/wall.post"))
            .and(body_string_contains("captcha_sid=548370162473"))
            .and(body_string_contains("captcha_key=x7z"))
            .respond_with(reply(r#"{"response":{"post_id":10}}"#))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/method/wall.post"))
            .respond_with(reply(
                r#"{"error":{"error_code":14,"error_msg":"Captcha needed","captcha_sid":"548370162473","captcha_img":"https://api.vk.com/captcha.php?sid=548370162473"}}"#,
            ))
            .mount(&server)
            .await;

        let api = mock_api(&server).await.build().await.unwrap();
        let request = api.method("wall.post").param("message", "hi");

        let err = request.send().await.unwrap_err();
        let challenge = err.as_api_error().unwrap();
        assert!(challenge.is_captcha_needed());
        let sid = challenge.captcha_sid.clone().unwrap();
        assert!(challenge.captcha_img.as_deref().unwrap().contains(&sid));

        let resp = request.captcha(sid, "x7z").send().await.unwrap();
        assert_eq!(resp["post_id"], 10);
    }

    #[tokio::test]
    async fn test_server_time_and_execute() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/method/getServerTime"))
            .respond_with(reply(r#"{"response":1700000000}"#))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/method/execute"))
            .and(body_string_contains("code=return+1%3B"))
            .respond_with(reply(r#"{"response":1}"#))
            .mount(&server)
            .await;

        let api = mock_api(&server).await.build().await.unwrap();
        let time = api.server_time().await.unwrap();
        assert_eq!(time.timestamp(), 1_700_000_000);

        assert_eq!(api.execute("return 1;").await.unwrap(), Value::from(1));
    }

    #[tokio::test]
    async fn test_invalid_method_name_never_hits_network() {
        let server = MockServer::start().await;
        let api = mock_api(&server).await.build().await.unwrap();

        let err = api.namespace("users").method("").send().await.unwrap_err();
        assert!(matches!(err, VkError::InvalidParam(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
