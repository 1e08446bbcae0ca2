// Файл: core/http.rs
// HTTP-сессия, общая для вызовов API и сценариев авторизации.

use super::error::CoreError;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{header, Client, RequestBuilder, Response, Url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const APP_USER_AGENT: &str = concat!(
    "vk-requests/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/vk-requests/vk-requests)"
);
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const API_BASE_URL: &str = "https://api.vk.com/method/";
const LOGIN_URL: &str = "https://m.vk.com";
const AUTHORIZE_URL: &str = "https://oauth.vk.com/authorize";
const ACCESS_TOKEN_URL: &str = "https://oauth.vk.com/access_token";
const REDIRECT_URI: &str = "https://oauth.vk.com/blank.html";

/// Адреса всех запросов. Тесты направляют их на локальный mock-сервер.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Вызов метода идет на `<api_base><namespace.method>`, поэтому адрес должен оканчиваться на `/`.
    pub api_base: Url,
    pub login: Url,
    pub authorize: Url,
    pub access_token: Url,
    pub redirect_uri: Url,
}

impl Endpoints {
    /// Размещает все адреса под одним базовым URL, например mock-сервера.
    pub fn with_base(base: &Url) -> Result<Self, CoreError> {
        Ok(Self {
            api_base: base.join("/method/")?,
            login: base.join("/login")?,
            authorize: base.join("/authorize")?,
            access_token: base.join("/access_token")?,
            redirect_uri: base.join("/blank.html")?,
        })
    }

    /// `<api_base><method_name>`. Принимаются только идентификаторы через точку,
    /// так что имя не может увести запрос (и токен) с `api_base`.
    pub fn method_url(&self, method_name: &str) -> Result<Url, CoreError> {
        validate_method_name(method_name)?;
        Ok(self.api_base.join(method_name)?)
    }
}

fn validate_method_name(name: &str) -> Result<(), CoreError> {
    let valid = !name.is_empty()
        && name.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidParam(format!("invalid method name {:?}", name)))
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        let parse = |s: &str| Url::parse(s).expect("Static VK endpoint URL must parse");
        Self {
            api_base: parse(API_BASE_URL),
            login: parse(LOGIN_URL),
            authorize: parse(AUTHORIZE_URL),
            access_token: parse(ACCESS_TOKEN_URL),
            redirect_uri: parse(REDIRECT_URI),
        }
    }
}

/// Тонкая обертка над `reqwest::Client` с хранилищем cookie (на нем держится
/// вход по паролю); каждый обмен пишется в лог на уровне debug.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    cookies: Arc<Jar>,
}

impl HttpSession {
    pub fn new(timeout: Duration) -> Result<Self, CoreError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(APP_USER_AGENT),
        );

        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&cookies))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self { client, cookies })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Есть ли в хранилище cookie `name` для `url`.
    pub fn has_cookie(&self, url: &Url, name: &str) -> bool {
        let Some(header) = self.cookies.cookies(url) else {
            return false;
        };
        let Ok(header) = header.to_str() else {
            return false;
        };
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(k, _)| k == name)
    }

    pub async fn get(&self, url: Url) -> Result<Response, CoreError> {
        log::debug!("GET {}", redacted(&url));
        self.send(self.client.get(url)).await
    }

    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: Url,
        form: &T,
    ) -> Result<Response, CoreError> {
        log::debug!("POST {}", redacted(&url));
        self.send(self.client.post(url).form(form)).await
    }

    /// GET JSON-документа независимо от HTTP-статуса: OAuth отдает ошибки
    /// JSON-телом в ответах 4xx.
    pub async fn fetch_json<T: for<'de> serde::Deserialize<'de>>(
        &self,
        url: Url,
    ) -> Result<T, CoreError> {
        let context = redacted(&url);
        let text = self.get(url).await?.text().await?;
        super::json::parse_json_from_text(&text, &context)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, CoreError> {
        let response = request.send().await.map_err(|e| {
            log::warn!("HTTP request failed: {}", e);
            CoreError::Network(e)
        })?;
        log::debug!("{} <- {}", response.status(), redacted(response.url()));
        Ok(response)
    }
}

/// URL без query и fragment: в обоих бывают токены и секреты.
pub(crate) fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

/// Оставляет первые четыре символа секрета, чтобы записи в логе можно было сопоставить.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        return "***".to_string();
    }
    let head: String = secret.chars().take(4).collect();
    format!("{}***", head)
}
