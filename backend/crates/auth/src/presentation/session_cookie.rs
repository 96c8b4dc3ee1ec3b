//! Session cookie plumbing
//!
//! Translates between request/response headers and session values using the
//! chunked cookie layout from `platform::cookie`.

use axum::http::{HeaderMap, header};
use axum::response::Response;
use platform::cookie::{
    build_chunked_delete_cookies, build_chunked_set_cookies, decode_cookie_value,
    existing_chunk_names, read_chunked_cookie, to_header_value,
};

use crate::application::config::AuthConfig;
use crate::domain::session::{CookieMutation, SessionTokens};

/// Raw session cookie value, stitched together from chunks if needed
pub fn read_session_cookie(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    read_chunked_cookie(headers, &config.session_cookie_name)
}

/// Set-Cookie values storing `tokens`
pub fn session_set_cookies(
    headers: &HeaderMap,
    config: &AuthConfig,
    tokens: &SessionTokens,
) -> Vec<String> {
    let existing = existing_chunk_names(headers, &config.session_cookie_name);
    match tokens.to_cookie_value() {
        Ok(value) => build_chunked_set_cookies(&config.session_cookie(), &value, &existing),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode session cookie");
            Vec::new()
        }
    }
}

/// Set-Cookie values removing the session cookie and every chunk of it
pub fn session_clear_cookies(headers: &HeaderMap, config: &AuthConfig) -> Vec<String> {
    let existing = existing_chunk_names(headers, &config.session_cookie_name);
    build_chunked_delete_cookies(&config.session_cookie(), &existing)
}

/// Set-Cookie values for a resolver mutation
pub fn mutation_cookies(
    headers: &HeaderMap,
    config: &AuthConfig,
    mutation: &CookieMutation,
) -> Vec<String> {
    match mutation {
        CookieMutation::Set(tokens) => session_set_cookies(headers, config, tokens),
        CookieMutation::Clear => session_clear_cookies(headers, config),
    }
}

/// PKCE verifier stored by the browser client.
///
/// The browser client stores it JSON-encoded, optionally followed by
/// `/<flow type>`.
pub fn read_code_verifier(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    let raw = read_chunked_cookie(headers, &config.code_verifier_cookie_name())?;
    let bytes = decode_cookie_value(&raw).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let stored = serde_json::from_str::<String>(&text).unwrap_or(text);

    let verifier = stored.split('/').next().unwrap_or_default();
    (!verifier.is_empty()).then(|| verifier.to_string())
}

/// Set-Cookie values removing the PKCE verifier
pub fn code_verifier_clear_cookies(headers: &HeaderMap, config: &AuthConfig) -> Vec<String> {
    let name = config.code_verifier_cookie_name();
    let existing = existing_chunk_names(headers, &name);
    build_chunked_delete_cookies(&config.code_verifier_cookie(), &existing)
}

/// Append Set-Cookie headers to a response
pub fn append_set_cookies(response: &mut Response, cookies: &[String]) {
    let headers = response.headers_mut();
    for value in cookies.iter().filter_map(|cookie| to_header_value(cookie)) {
        headers.append(header::SET_COOKIE, value);
    }
}
