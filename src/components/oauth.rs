//! Google OAuth2 authorization-code login.
//!
//! Only the parts needed to populate the authorized-client store: build the
//! consent URL, exchange the returned code for tokens and learn who logged in.

use crate::config::{
    Config, DEFAULT_OAUTH_AUTH_URL, DEFAULT_OAUTH_TOKEN_URL, DEFAULT_OAUTH_USERINFO_URL,
};
use crate::error::{config_error, oauth_error, AgendaResult};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Scopes requested at login
pub const SCOPES: [&str; 4] = [
    "openid",
    "email",
    "profile",
    "https://www.googleapis.com/auth/calendar",
];

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry as a unix timestamp
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_in.map(|secs| Utc::now().timestamp() + secs)
    }

    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
}

/// OAuth2 client registration for Google
#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    http: Client,
}

impl GoogleOAuthClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        http: Client,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            auth_url: DEFAULT_OAUTH_AUTH_URL.to_string(),
            token_url: DEFAULT_OAUTH_TOKEN_URL.to_string(),
            userinfo_url: DEFAULT_OAUTH_USERINFO_URL.to_string(),
            http,
        }
    }

    /// Point the code exchange and userinfo lookup somewhere else
    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    pub fn with_authorization_endpoint(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    pub fn from_config(config: &Config) -> AgendaResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| config_error(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.oauth_redirect_uri.clone(),
            http,
        )
        .with_authorization_endpoint(config.oauth_auth_url.clone())
        .with_endpoints(config.oauth_token_url.clone(), config.oauth_userinfo_url.clone()))
    }

    /// Consent page URL carrying the given anti-forgery state
    pub fn authorization_url(&self, state: &str) -> AgendaResult<String> {
        let mut url = Url::parse(&self.auth_url)
            .map_err(|e| oauth_error(&format!("Failed to parse URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("state", state);

        Ok(url.into())
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> AgendaResult<TokenResponse> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| oauth_error(&format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(oauth_error(&format!(
                "Failed to get token: HTTP {} - {}",
                status, error_body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| oauth_error(&format!("Failed to parse token response: {}", e)))?;

        debug!("Received access token, refresh token present: {}", token.refresh_token.is_some());
        Ok(token)
    }

    /// Stable principal name (`sub`) of the user owning the token
    pub async fn fetch_principal_name(&self, access_token: &str) -> AgendaResult<String> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| oauth_error(&format!("Userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(oauth_error(&format!(
                "Failed to fetch userinfo: HTTP {}",
                response.status()
            )));
        }

        let user: UserInfo = response
            .json()
            .await
            .map_err(|e| oauth_error(&format!("Failed to parse userinfo: {}", e)))?;

        info!(
            "Google login for {} ({})",
            user.sub,
            user.email.as_deref().unwrap_or("no email")
        );
        Ok(user.sub)
    }
}
