//! Cookie Management Infrastructure
//!
//! Reading and writing cookies, including values too large for a single
//! cookie. Large values are split into `name.0`, `name.1`, ... and stitched
//! back together on read, the same layout the identity provider's browser
//! client uses, so both sides can read what the other wrote.

use axum::http::{HeaderMap, HeaderValue};
use axum_extra::extract::cookie::CookieJar;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Largest value stored in a single cookie before splitting into chunks.
pub const MAX_CHUNK_SIZE: usize = 3180;

/// Prefix marking a base64url-encoded cookie value.
pub const BASE64_PREFIX: &str = "base64-";

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl std::str::FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            other => Err(format!("unknown SameSite policy: {other}")),
        }
    }
}

/// Cookie attributes
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age_secs: Option<i64>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: None,
        }
    }
}

impl CookieConfig {
    /// Same attributes under a different cookie name
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}", self.path));

        if let Some(max_age) = self.max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }

        cookie
    }

    /// Build Set-Cookie header for deletion (expired)
    pub fn build_delete_cookie(&self) -> String {
        let mut cookie = format!("{}=; Path={}; Max-Age=0", self.name, self.path);
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie
    }
}

/// Name of the `index`-th chunk of `name`
pub fn chunk_name(name: &str, index: usize) -> String {
    format!("{name}.{index}")
}

fn is_cookie_or_chunk(candidate: &str, name: &str) -> bool {
    if candidate == name {
        return true;
    }
    candidate
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Read a possibly-chunked cookie.
///
/// An unchunked `name` cookie wins over chunks. Chunks are read in order
/// starting at `name.0` until the first gap.
pub fn read_chunked_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);

    if let Some(cookie) = jar.get(name) {
        return Some(cookie.value().to_string());
    }

    let mut value = String::new();
    for index in 0.. {
        match jar.get(&chunk_name(name, index)) {
            Some(chunk) => value.push_str(chunk.value()),
            None => break,
        }
    }

    (!value.is_empty()).then_some(value)
}

/// Names of `name` and all of its chunks present on the request
pub fn existing_chunk_names(headers: &HeaderMap, name: &str) -> Vec<String> {
    let mut names: Vec<String> = CookieJar::from_headers(headers)
        .iter()
        .map(|cookie| cookie.name().to_string())
        .filter(|candidate| is_cookie_or_chunk(candidate, name))
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Split `value` into pieces of at most `max` bytes on char boundaries
pub fn split_chunks(value: &str, max: usize) -> Vec<&str> {
    if value.len() <= max || max == 0 {
        return vec![value];
    }

    let mut chunks = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let mut end = rest.len().min(max);
        while end > 0 && !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // single char wider than max
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Set-Cookie values writing `value` under `config.name`.
///
/// `existing` lists the cookie names the request carried (see
/// [`existing_chunk_names`]); any of them not overwritten here is deleted so
/// the browser never ends up with a mix of old and new chunks.
pub fn build_chunked_set_cookies(
    config: &CookieConfig,
    value: &str,
    existing: &[String],
) -> Vec<String> {
    let chunks = split_chunks(value, MAX_CHUNK_SIZE);

    let written: Vec<(String, &str)> = if chunks.len() == 1 {
        vec![(config.name.clone(), value)]
    } else {
        chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| (chunk_name(&config.name, index), chunk))
            .collect()
    };

    let mut headers: Vec<String> = written
        .iter()
        .map(|(name, chunk)| config.with_name(name.as_str()).build_set_cookie(chunk))
        .collect();

    for stale in existing
        .iter()
        .filter(|name| !written.iter().any(|(written_name, _)| written_name == *name))
    {
        headers.push(config.with_name(stale.as_str()).build_delete_cookie());
    }

    headers
}

/// Set-Cookie values deleting `config.name` and every chunk in `existing`
pub fn build_chunked_delete_cookies(config: &CookieConfig, existing: &[String]) -> Vec<String> {
    if existing.is_empty() {
        return vec![config.build_delete_cookie()];
    }
    existing
        .iter()
        .map(|name| config.with_name(name.as_str()).build_delete_cookie())
        .collect()
}

/// Cookie value decoding failure
#[derive(Debug, thiserror::Error)]
pub enum CookieValueError {
    #[error("invalid base64 cookie value: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid percent-encoded cookie value: {0}")]
    PercentEncoding(#[from] std::string::FromUtf8Error),
}

/// Encode bytes as `base64-<base64url>`
pub fn encode_cookie_value(bytes: &[u8]) -> String {
    format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Decode a cookie value written by [`encode_cookie_value`].
///
/// Values without the prefix are treated as percent-encoded text, the
/// format older browser clients wrote.
pub fn decode_cookie_value(raw: &str) -> Result<Vec<u8>, CookieValueError> {
    if let Some(encoded) = raw.strip_prefix(BASE64_PREFIX) {
        return Ok(URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('='))?);
    }
    Ok(urlencoding::decode(raw)?.into_owned().into_bytes())
}

/// Convert a Set-Cookie string into a header value, skipping invalid ones
pub fn to_header_value(set_cookie: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(set_cookie) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "Dropping invalid Set-Cookie value");
            None
        }
    }
}
