use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Registration id of the Google OAuth2 client
pub const GOOGLE_REGISTRATION_ID: &str = "google";

/// The signed-in user as seen by the OAuth2 provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Provider registration the user logged in through
    pub registration_id: String,
    /// Stable user name issued by the provider
    pub name: String,
}

impl Principal {
    pub fn new(registration_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            registration_id: registration_id.into(),
            name: name.into(),
        }
    }
}

/// Tokens issued to this application for one principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedClient {
    pub principal: Principal,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp, informational only
    pub expires_at: Option<i64>,
    pub scopes: Vec<String>,
}

/// Turns a session principal into the bearer token to call Google with
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve_access_token(&self, principal: Option<&Principal>) -> Result<String, AuthError>;
}

/// In-memory authorized-client store keyed by (registration id, principal name)
#[derive(Debug, Clone, Default)]
pub struct AuthorizedClientStore {
    clients: Arc<RwLock<HashMap<(String, String), AuthorizedClient>>>,
}

impl AuthorizedClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save or replace the authorized client of a principal
    pub async fn save_authorized_client(&self, client: AuthorizedClient) {
        let key = (
            client.principal.registration_id.clone(),
            client.principal.name.clone(),
        );
        self.clients.write().await.insert(key, client);
    }

    pub async fn load_authorized_client(
        &self,
        registration_id: &str,
        principal_name: &str,
    ) -> Option<AuthorizedClient> {
        let clients = self.clients.read().await;
        clients
            .get(&(registration_id.to_string(), principal_name.to_string()))
            .cloned()
    }

    pub async fn remove_authorized_client(&self, registration_id: &str, principal_name: &str) {
        self.clients
            .write()
            .await
            .remove(&(registration_id.to_string(), principal_name.to_string()));
    }
}

#[async_trait]
impl CredentialResolver for AuthorizedClientStore {
    async fn resolve_access_token(&self, principal: Option<&Principal>) -> Result<String, AuthError> {
        let principal = principal.ok_or(AuthError::NotAuthenticated)?;

        let client = self
            .load_authorized_client(&principal.registration_id, &principal.name)
            .await
            .ok_or_else(|| AuthError::NoAuthorizedClient {
                registration_id: principal.registration_id.clone(),
                principal: principal.name.clone(),
            })?;

        debug!("Resolved access token for principal {}", principal.name);
        Ok(client.access_token)
    }
}
