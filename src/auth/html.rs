// Файл: auth/html.rs
// Разбор страниц мобильного входа и подтверждения доступа OAuth.

use crate::core::VkError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use url::{form_urlencoded, Url};

static FORM_ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<form\s[^>]*?action="([^"]+)""#).expect("Static regex must compile")
});

static FIELD_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<span\s+class="field_prefix"[^>]*>(.*?)</span>"#)
        .expect("Static regex must compile")
});

static PAGE_WARNING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<div[^>]+class="service_msg service_msg_warning"[^>]*>(.+?)</div>"#)
        .expect("Static regex must compile")
});

static TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("Static regex must compile"));

fn unescape(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&nbsp;", "")
        .replace("&quot;", "\"")
        .replace('\u{a0}', "")
}

/// `action` первой формы на странице.
pub fn parse_form_action_url(html: &str) -> Option<String> {
    FORM_ACTION
        .captures(html)
        .map(|caps| unescape(&caps[1]))
}

/// Префикс и суффикс, которые VK показывает вокруг скрытых цифр телефона.
pub fn parse_masked_phone_number(html: &str) -> Result<(String, String), VkError> {
    let fields: Vec<String> = FIELD_PREFIX
        .captures_iter(html)
        .map(|caps| {
            let text = TAGS.replace_all(&caps[1], "");
            unescape(&text).split_whitespace().collect()
        })
        .collect();

    match fields.as_slice() {
        [prefix, suffix, ..] => Ok((prefix.clone(), suffix.clone())),
        [prefix] => Ok((prefix.clone(), String::new())),
        [] => Err(VkError::auth(
            "security check page has no masked phone number",
        )),
    }
}

/// Возвращает цифры, скрытые VK между `prefix` и `suffix`.
pub fn check_phone_number(phone_number: &str, prefix: &str, suffix: &str) -> Result<String, VkError> {
    let number: String = phone_number.split_whitespace().collect();
    number
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(suffix))
        .filter(|middle| !middle.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            VkError::auth(format!(
                "phone number does not match the masked one ({}...{})",
                prefix, suffix
            ))
        })
}

/// Ошибка, если на странице есть блок предупреждения VK.
pub fn check_html_warnings(html: &str) -> Result<(), VkError> {
    let warnings: Vec<String> = PAGE_WARNING
        .captures_iter(html)
        .map(|caps| unescape(TAGS.replace_all(&caps[1], " ").trim()))
        .filter(|w| !w.is_empty())
        .collect();

    if warnings.is_empty() {
        Ok(())
    } else {
        Err(VkError::PageWarnings(warnings.join("; ")))
    }
}

/// Параметры query из `url` или из его fragment, если задан `fragment`
/// (implicit flow возвращает токен после `#`).
pub fn parse_url_query_params(url: &Url, fragment: bool) -> HashMap<String, String> {
    if fragment {
        form_urlencoded::parse(url.fragment().unwrap_or_default().as_bytes())
            .into_owned()
            .collect()
    } else {
        url.query_pairs().into_owned().collect()
    }
}
