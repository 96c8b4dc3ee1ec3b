//! Route Classification
//!
//! Every request path falls into exactly one [`RouteClass`]. The table is
//! checked in a fixed priority order: static assets, provider passthrough,
//! auth-flow pages, public pages, and finally the protected default.

use derive_more::Display;

/// Access-control category of a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum RouteClass {
    #[display("public")]
    Public,
    #[display("auth_only")]
    AuthOnly,
    #[display("protected")]
    Protected,
    #[display("static_asset")]
    StaticAsset,
    #[display("api_auth_passthrough")]
    ApiAuthPassthrough,
}

impl RouteClass {
    /// Whether the gate needs to resolve a session for this class.
    ///
    /// Static assets never depend on identity, and passthrough routes
    /// manage session cookies themselves.
    pub fn needs_session(&self) -> bool {
        !matches!(self, RouteClass::StaticAsset | RouteClass::ApiAuthPassthrough)
    }
}

/// Fixed route table.
///
/// Prefixes are segment-aware: `/login` matches `/login` and `/login/x` but
/// not `/loginx`. The root prefix `/` matches only the root itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub static_prefixes: Vec<String>,
    /// Lowercase extensions without the dot
    pub static_extensions: Vec<String>,
    pub passthrough_prefixes: Vec<String>,
    pub auth_only_prefixes: Vec<String>,
    pub public_prefixes: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            static_prefixes: owned(&[
                "/_next/static",
                "/_next/image",
                "/assets",
                "/public",
                "/favicon.ico",
            ]),
            static_extensions: owned(&[
                "css",
                "js",
                "map",
                "ico",
                "png",
                "jpg",
                "jpeg",
                "gif",
                "svg",
                "webp",
                "avif",
                "woff",
                "woff2",
                "ttf",
                "txt",
                "xml",
                "webmanifest",
            ]),
            passthrough_prefixes: owned(&[
                "/auth/callback",
                "/auth-handler",
                "/api/auth",
                "/api/public",
            ]),
            auth_only_prefixes: owned(&["/login", "/register", "/reset-password", "/verify-email"]),
            public_prefixes: owned(&["/", "/pricing", "/contact"]),
        }
    }
}

impl RouteTable {
    /// Classify a request path
    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize_path(path);

        if self.is_static_asset(&path) {
            RouteClass::StaticAsset
        } else if matches_any(&path, &self.passthrough_prefixes) {
            RouteClass::ApiAuthPassthrough
        } else if matches_any(&path, &self.auth_only_prefixes) {
            RouteClass::AuthOnly
        } else if matches_any(&path, &self.public_prefixes) {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }

    fn is_static_asset(&self, path: &str) -> bool {
        if matches_any(path, &self.static_prefixes) {
            return true;
        }

        let last_segment = path.rsplit('/').next().unwrap_or_default();
        match last_segment.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => {
                let extension = extension.to_ascii_lowercase();
                self.static_extensions.iter().any(|known| *known == extension)
            }
            _ => false,
        }
    }
}

fn matches_any(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| matches_prefix(path, prefix))
}

/// Segment-aware prefix test on a normalized path
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path == "/";
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Normalize a request path for classification.
///
/// Adds a leading slash, collapses repeated slashes and drops a trailing
/// slash (the root stays `/`).
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}
