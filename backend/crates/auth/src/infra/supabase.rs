//! Supabase Auth (GoTrue) client
//!
//! Implements [`IdentityProvider`] over the `/auth/v1` REST API. Every call
//! carries the project's anon key in `apikey`; user-scoped calls add the
//! user's access token as the bearer.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::domain::credentials::{Email, NewPassword};
use crate::domain::identity::Identity;
use crate::domain::provider::{IdentityProvider, NewAccount, SignUpOutcome};
use crate::domain::session::SessionTokens;
use crate::error::{AuthError, AuthResult};

/// Fields GoTrue uses for error text, most specific first
const ERROR_FIELDS: [&str; 4] = ["error_description", "msg", "message", "error"];

/// Connection settings for the hosted project
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub url: String,
    pub anon_key: String,
    pub timeout: Duration,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// First label of the project host (`abcd` for `https://abcd.supabase.co`)
    pub fn project_ref(&self) -> Option<&str> {
        let without_scheme = self
            .url
            .split_once("://")
            .map_or(self.url.as_str(), |(_, rest)| rest);
        let host = without_scheme
            .split(['/', ':', '?'])
            .next()
            .unwrap_or_default();
        host.split('.').next().filter(|label| !label.is_empty())
    }

    /// Cookie name the browser client uses for this project
    pub fn session_cookie_name(&self) -> String {
        format!("sb-{}-auth-token", self.project_ref().unwrap_or("local"))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url.trim_end_matches('/'), path)
    }
}

/// Pull the human-readable message out of a GoTrue error body
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ERROR_FIELDS.iter().find_map(|field| {
        value
            .get(field)
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    })
}

/// GoTrue-backed identity provider
#[derive(Debug, Clone)]
pub struct SupabaseIdentityProvider {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseIdentityProvider {
    pub fn new(config: SupabaseConfig) -> AuthResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Request authorized by the anon key alone
    fn anon_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.config.endpoint(path))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    /// Request on behalf of the user owning `access_token`
    fn user_request(&self, method: Method, path: &str, access_token: &str) -> RequestBuilder {
        self.client
            .request(method, self.config.endpoint(path))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
    }

    async fn send(&self, request: RequestBuilder) -> AuthResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        if status.is_client_error() {
            Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            })
        } else {
            Err(AuthError::Provider(format!("{status}: {message}")))
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AuthResult<T> {
        Ok(self.send(request).await?.json::<T>().await?)
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> AuthResult<SessionTokens> {
        let request = self
            .anon_request(Method::POST, "token")
            .query(&[("grant_type", grant_type)])
            .json(&body);
        self.send_json(request).await
    }
}

impl IdentityProvider for SupabaseIdentityProvider {
    async fn get_user(&self, access_token: &str) -> AuthResult<Identity> {
        let user: Value = self
            .send_json(self.user_request(Method::GET, "user", access_token))
            .await?;
        Ok(Identity::from_user_json(&user)?)
    }

    async fn refresh_session(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> AuthResult<SessionTokens> {
        self.token_grant(
            "pkce",
            json!({ "auth_code": auth_code, "code_verifier": code_verifier }),
        )
        .await
    }

    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> AuthResult<SessionTokens> {
        self.token_grant(
            "password",
            json!({ "email": email.as_str(), "password": password }),
        )
        .await
    }

    async fn sign_up(&self, account: &NewAccount) -> AuthResult<SignUpOutcome> {
        let mut data = serde_json::Map::new();
        if let Some(first_name) = &account.first_name {
            data.insert("first_name".to_string(), json!(first_name.as_str()));
        }
        if let Some(last_name) = &account.last_name {
            data.insert("last_name".to_string(), json!(last_name.as_str()));
        }

        let request = self
            .anon_request(Method::POST, "signup")
            .query(&[("redirect_to", account.email_redirect_to.as_str())])
            .json(&json!({
                "email": account.email.as_str(),
                "password": account.password.expose(),
                "data": data,
            }));
        let body: Value = self.send_json(request).await?;

        if body.get("access_token").is_some() {
            return Ok(SignUpOutcome::Session(serde_json::from_value(body)?));
        }
        let user = body.get("user").unwrap_or(&body);
        Ok(SignUpOutcome::ConfirmationPending(Identity::from_user_json(
            user,
        )?))
    }

    async fn recover_password(&self, email: &Email, redirect_to: &str) -> AuthResult<()> {
        let request = self
            .anon_request(Method::POST, "recover")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email.as_str() }));
        self.send(request).await?;
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &NewPassword) -> AuthResult<()> {
        let request = self
            .user_request(Method::PUT, "user", access_token)
            .json(&json!({ "password": password.expose() }));
        self.send(request).await?;
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let request = self
            .user_request(Method::POST, "logout", access_token)
            .query(&[("scope", "local")]);
        match self.send(request).await {
            Ok(_) => Ok(()),
            // Session already gone at the provider
            Err(AuthError::Rejected { status, .. }) if matches!(status, 401 | 403 | 404) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::PersonName;
    use httpmock::prelude::*;

    const ANON_KEY: &str = "anon-key";
    const USER_ID: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";

    fn provider(server: &MockServer) -> SupabaseIdentityProvider {
        SupabaseIdentityProvider::new(SupabaseConfig::new(server.base_url(), ANON_KEY)).unwrap()
    }

    fn session_body() -> Value {
        json!({
            "access_token": "access-new",
            "refresh_token": "refresh-new",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_700_003_600,
            "user": { "id": USER_ID, "email": "anna@example.com" }
        })
    }

    #[test]
    fn test_project_ref_and_cookie_name() {
        let config = SupabaseConfig::new("https://abcd1234.supabase.co/", ANON_KEY);
        assert_eq!(config.project_ref(), Some("abcd1234"));
        assert_eq!(config.session_cookie_name(), "sb-abcd1234-auth-token");

        let local = SupabaseConfig::new("http://localhost:54321", ANON_KEY);
        assert_eq!(local.session_cookie_name(), "sb-localhost-auth-token");
    }

    #[test]
    fn test_endpoint() {
        let config = SupabaseConfig::new("https://abcd.supabase.co/", ANON_KEY);
        assert_eq!(
            config.endpoint("token"),
            "https://abcd.supabase.co/auth/v1/token"
        );
    }

    #[test]
    fn test_error_message_fields() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            error_message(r#"{"code":422,"msg":"User already registered"}"#).as_deref(),
            Some("User already registered")
        );
        assert_eq!(
            error_message(r#"{"message":"invalid JWT"}"#).as_deref(),
            Some("invalid JWT")
        );
        assert_eq!(error_message("<html>"), None);
    }

    #[tokio::test]
    async fn test_get_user_sends_both_keys() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/auth/v1/user")
                    .header("apikey", ANON_KEY)
                    .header("authorization", "Bearer user-token");
                then.status(200)
                    .json_body(json!({ "id": USER_ID, "email": "anna@example.com" }));
            })
            .await;

        let identity = provider(&server).get_user("user-token").await.unwrap();

        mock.assert_async().await;
        assert_eq!(identity.user_id.to_string(), USER_ID);
        assert_eq!(identity.email.as_deref(), Some("anna@example.com"));
    }

    #[tokio::test]
    async fn test_get_user_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/auth/v1/user");
                then.status(401).json_body(json!({
                    "code": 401,
                    "msg": "invalid JWT: unable to parse or verify signature"
                }));
            })
            .await;

        let err = provider(&server).get_user("forged").await.unwrap_err();

        assert!(err.is_rejection());
        assert_eq!(
            err.to_string(),
            "invalid JWT: unable to parse or verify signature"
        );
    }

    #[tokio::test]
    async fn test_refresh_session() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/v1/token")
                    .query_param("grant_type", "refresh_token")
                    .json_body(json!({ "refresh_token": "refresh-old" }));
                then.status(200).json_body(session_body());
            })
            .await;

        let tokens = provider(&server)
            .refresh_session("refresh-old")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(tokens.access_token, "access-new");
        assert_eq!(tokens.refresh_token, "refresh-new");
        assert_eq!(tokens.expires_at, Some(1_700_003_600));
    }

    #[tokio::test]
    async fn test_server_error_is_not_rejection() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/token");
                then.status(503).body("upstream unavailable");
            })
            .await;

        let err = provider(&server)
            .refresh_session("refresh-old")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Provider(_)));
        assert!(!err.is_rejection());
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/v1/token")
                    .query_param("grant_type", "pkce")
                    .json_body(json!({ "auth_code": "code-1", "code_verifier": "verifier-1" }));
                then.status(200).json_body(session_body());
            })
            .await;

        let tokens = provider(&server)
            .exchange_code("code-1", "verifier-1")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(tokens.access_token, "access-new");
    }

    #[tokio::test]
    async fn test_password_sign_in_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/v1/token")
                    .query_param("grant_type", "password");
                then.status(400).json_body(json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid login credentials"
                }));
            })
            .await;

        let email = Email::new("anna@example.com").unwrap();
        let err = provider(&server)
            .sign_in_with_password(&email, "wrong")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Rejected { status: 400, .. }));
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/v1/signup")
                    .query_param("redirect_to", "https://crm.example/auth/callback")
                    .json_body(json!({
                        "email": "anna@example.com",
                        "password": "Sekret123",
                        "data": { "first_name": "Anna" }
                    }));
                then.status(200)
                    .json_body(json!({ "id": USER_ID, "email": "anna@example.com" }));
            })
            .await;

        let account = NewAccount {
            email: Email::new("anna@example.com").unwrap(),
            password: NewPassword::new("Sekret123").unwrap(),
            first_name: Some(PersonName::new("First name", "Anna").unwrap()),
            last_name: None,
            email_redirect_to: "https://crm.example/auth/callback".to_string(),
        };
        let outcome = provider(&server).sign_up(&account).await.unwrap();

        mock.assert_async().await;
        assert!(matches!(outcome, SignUpOutcome::ConfirmationPending(_)));
    }

    #[tokio::test]
    async fn test_sign_up_with_session() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/signup");
                then.status(200).json_body(session_body());
            })
            .await;

        let account = NewAccount {
            email: Email::new("anna@example.com").unwrap(),
            password: NewPassword::new("Sekret123").unwrap(),
            first_name: None,
            last_name: None,
            email_redirect_to: "https://crm.example/auth/callback".to_string(),
        };
        let outcome = provider(&server).sign_up(&account).await.unwrap();

        assert!(matches!(outcome, SignUpOutcome::Session(ref t) if t.access_token == "access-new"));
    }

    #[tokio::test]
    async fn test_recover_password() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/v1/recover")
                    .query_param("redirect_to", "https://crm.example/reset-password/confirm")
                    .json_body(json!({ "email": "anna@example.com" }));
                then.status(200).json_body(json!({}));
            })
            .await;

        let email = Email::new("anna@example.com").unwrap();
        provider(&server)
            .recover_password(&email, "https://crm.example/reset-password/confirm")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_password() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/auth/v1/user")
                    .header("authorization", "Bearer user-token")
                    .json_body(json!({ "password": "Nowe1234" }));
                then.status(200)
                    .json_body(json!({ "id": USER_ID }));
            })
            .await;

        let password = NewPassword::new("Nowe1234").unwrap();
        provider(&server)
            .update_password("user-token", &password)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sign_out_tolerates_missing_session() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/v1/logout")
                    .query_param("scope", "local")
                    .header("authorization", "Bearer user-token");
                then.status(404).json_body(json!({ "msg": "Session not found" }));
            })
            .await;

        provider(&server).sign_out("user-token").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let config = SupabaseConfig::new("http://127.0.0.1:9", ANON_KEY)
            .with_timeout(Duration::from_secs(2));
        let provider = SupabaseIdentityProvider::new(config).unwrap();

        let err = provider.get_user("user-token").await.unwrap_err();

        assert!(matches!(err, AuthError::Provider(_)));
    }
}
