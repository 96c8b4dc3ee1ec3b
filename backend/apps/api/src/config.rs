//! Server configuration
//!
//! Read once at startup from the process environment (after `.env` is
//! loaded). Missing required values abort startup.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::{AuthConfig, SupabaseConfig};
use platform::rate_limit::RateLimitConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "https://serviceflowcrm.pl";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub bind_addr: SocketAddr,
    /// Origins allowed to call `/api/*` with credentials
    pub frontend_origins: Vec<String>,
    pub cookie_secure: bool,
    /// Overrides the name derived from the project URL
    pub session_cookie_name: Option<String>,
    /// Absolute base for links sent in emails
    pub site_url: Option<String>,
    pub rate_limit: RateLimitConfig,
    pub provider_timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let supabase_url = get("SUPABASE_URL").context("SUPABASE_URL must be set")?;
        let supabase_anon_key =
            get("SUPABASE_ANON_KEY").context("SUPABASE_ANON_KEY must be set")?;

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let frontend_origins: Vec<String> = get("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).context("COOKIE_SECURE must be true or false")?,
            None => !cfg!(debug_assertions),
        };

        let max_requests = match get("RATE_LIMIT_MAX") {
            Some(raw) => raw.parse().context("RATE_LIMIT_MAX must be a number")?,
            None => RateLimitConfig::default().max_requests,
        };
        let window_secs = match get("RATE_LIMIT_WINDOW_SECS") {
            Some(raw) => raw.parse().context("RATE_LIMIT_WINDOW_SECS must be a number")?,
            None => RateLimitConfig::default().window.as_secs(),
        };
        if max_requests == 0 || window_secs == 0 {
            bail!("rate limit values must be greater than zero");
        }

        let provider_timeout = match get("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .context("PROVIDER_TIMEOUT_SECS must be a number")?,
            ),
            None => Duration::from_secs(10),
        };

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            bind_addr,
            frontend_origins,
            cookie_secure,
            session_cookie_name: get("SESSION_COOKIE_NAME"),
            site_url: get("SITE_URL"),
            rate_limit: RateLimitConfig::new(max_requests, window_secs),
            provider_timeout,
        })
    }

    pub fn supabase(&self) -> SupabaseConfig {
        SupabaseConfig::new(&self.supabase_url, &self.supabase_anon_key)
            .with_timeout(self.provider_timeout)
    }

    /// Gate settings; the cookie name matches the browser client's
    pub fn auth(&self) -> AuthConfig {
        let defaults = AuthConfig::default();
        AuthConfig {
            session_cookie_name: self
                .session_cookie_name
                .clone()
                .unwrap_or_else(|| self.supabase().session_cookie_name()),
            site_url: self.site_url.clone().unwrap_or(defaults.site_url.clone()),
            cookie_secure: self.cookie_secure,
            ..defaults
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
