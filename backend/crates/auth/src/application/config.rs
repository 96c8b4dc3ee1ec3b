//! Application Configuration
//!
//! Configuration for the gate and the auth flows.

use std::time::Duration;

use platform::cookie::CookieConfig;
/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

use crate::domain::route::RouteTable;

/// Browsers cap cookie lifetime at 400 days
const SESSION_COOKIE_MAX_AGE: Duration = Duration::from_secs(400 * 24 * 3600);

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Route table used by the gate
    pub routes: RouteTable,
    pub login_path: String,
    pub dashboard_path: String,
    /// Where the provider sends users back with a one-time code
    pub callback_path: String,
    /// Page completing implicit-flow logins
    pub auth_handler_path: String,
    /// Page where a recovered user picks a new password
    pub reset_confirm_path: String,
    /// Public origin of the site, used in links sent by email
    pub site_url: String,
    /// Session cookie name (`sb-<ref>-auth-token`)
    pub session_cookie_name: String,
    pub session_cookie_max_age: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Refresh sessions expiring within this window
    pub refresh_margin: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            routes: RouteTable::default(),
            login_path: "/login".to_string(),
            dashboard_path: "/dashboard".to_string(),
            callback_path: "/auth/callback".to_string(),
            auth_handler_path: "/auth-handler".to_string(),
            reset_confirm_path: "/reset-password/confirm".to_string(),
            site_url: "https://serviceflowcrm.pl".to_string(),
            session_cookie_name: "sb-auth-token".to_string(),
            session_cookie_max_age: SESSION_COOKIE_MAX_AGE,
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            refresh_margin: Duration::from_secs(60),
        }
    }
}

impl AuthConfig {
    /// Create config for development (insecure cookie, local site URL)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            site_url: "http://localhost:31113".to_string(),
            ..Default::default()
        }
    }

    /// Attributes of the session cookie
    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.session_cookie_max_age.as_secs() as i64),
        }
    }

    /// PKCE verifier cookie written by the browser client
    pub fn code_verifier_cookie_name(&self) -> String {
        format!("{}-code-verifier", self.session_cookie_name)
    }

    pub fn code_verifier_cookie(&self) -> CookieConfig {
        self.session_cookie()
            .with_name(self.code_verifier_cookie_name())
    }

    /// Refresh margin as a chrono duration
    pub fn refresh_margin(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.refresh_margin).unwrap_or(chrono::Duration::seconds(60))
    }

    /// Absolute URL for a site path
    pub fn site_link(&self, path: &str) -> String {
        format!("{}{}", self.site_url.trim_end_matches('/'), path)
    }
}
