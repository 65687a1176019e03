//! Payment-network login (Pi Platform `/v2/me`).
//!
//! The network identity is independent of the hosted identity service. A
//! user authenticated here has a network uid and, when the `username` scope
//! was granted, a username.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::types::IdentityError;
use crate::config::NetworkConfig;

/// Record shape returned by the network's `/v2/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkUser {
    pub uid: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Authenticates the device's network account.
#[async_trait::async_trait]
pub trait NetworkAuthenticator: Send + Sync {
    async fn authenticate(&self) -> Result<NetworkUser, IdentityError>;
}

pub struct PiNetwork {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl PiNetwork {
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(config: &NetworkConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, base_url: config.base_url.clone(), access_token: config.access_token.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl NetworkAuthenticator for PiNetwork {
    async fn authenticate(&self) -> Result<NetworkUser, IdentityError> {
        let resp = self
            .http
            .get(format!("{}/v2/me", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(IdentityError::CredentialRejected("network access token rejected".into()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Transport(format!("network login failed: {status}: {body}")));
        }

        let user: NetworkUser = resp
            .json()
            .await
            .map_err(|e| IdentityError::Transport(format!("unexpected network user: {e}")))?;
        info!(uid = %user.uid, "network login accepted");
        Ok(user)
    }
}
