//! Hosted identity service client: GoTrue auth endpoints plus the PostgREST
//! `profiles` table.
//!
//! DESIGN
//! ======
//! The client keeps the vendor-side notion of "current session" (what a
//! browser SDK would persist locally) and emits `AuthEvent`s whenever it
//! changes. The session store consumes those events; it never reads this
//! client's state except through the one-time `current_session` probe.
//!
//! An expired session found by the probe is refreshed once. If refresh fails
//! the session is dropped and `SignedOut` is emitted.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::types::{AuthEvent, Credentials, IdentityError, Profile, Session, SessionUser, SignUpAttributes};
use super::{AuthEvents, IdentityService, ProfileSource};
use crate::config::IdentityConfig;

const PROFILE_COLUMNS: &str = "id,username,full_name,avatar_url,is_provider";

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    expires_at: Option<u64>,
    user: SessionUser,
}

impl TokenResponse {
    fn into_session(self, now: u64) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now.saturating_add(secs)));
        Session { access_token: self.access_token, refresh_token: self.refresh_token, expires_at, user: self.user }
    }
}

/// Error body shapes differ between GoTrue versions.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Map a non-success auth response to the error taxonomy.
pub(crate) fn auth_error(status: u16, body: &str) -> IdentityError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .unwrap_or_else(|| body.to_owned());

    match status {
        400 | 401 | 403 | 422 => IdentityError::CredentialRejected(message),
        404 => IdentityError::NotFound,
        _ => IdentityError::Transport(format!("status {status}: {message}")),
    }
}

/// Parse a sign-up response, which carries either a full session or just the
/// pending user when email confirmation is enabled.
pub(crate) fn parse_sign_up(body: serde_json::Value, email: &str, now: u64) -> Result<Session, IdentityError> {
    if body.get("access_token").is_none() {
        return Err(IdentityError::ConfirmationRequired { email: email.to_owned() });
    }
    let token: TokenResponse =
        serde_json::from_value(body).map_err(|e| IdentityError::Transport(format!("unexpected sign-up response: {e}")))?;
    Ok(token.into_session(now))
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct RemoteIdentity {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    current: Mutex<Option<Session>>,
    events: AuthEvents,
}

impl RemoteIdentity {
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            anon_key: config.anon_key.clone(),
            current: Mutex::new(None),
            events: AuthEvents::new(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn profile_url(&self, user_id: Uuid) -> String {
        format!("{}/rest/v1/profiles?id=eq.{user_id}&select={PROFILE_COLUMNS}", self.base_url)
    }

    fn current(&self) -> Option<Session> {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn set_current(&self, session: Option<Session>) {
        *self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = session;
    }

    async fn post_auth(&self, path: &str, bearer: Option<&str>, body: &serde_json::Value) -> Result<reqwest::Response, IdentityError> {
        let resp = self
            .http
            .post(self.auth_url(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.anon_key))
            .json(body)
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        Err(auth_error(status, &text))
    }

    async fn token_grant(&self, grant_type: &str, body: &serde_json::Value) -> Result<Session, IdentityError> {
        let resp = self
            .post_auth(&format!("token?grant_type={grant_type}"), None, body)
            .await?;
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| IdentityError::Transport(format!("unexpected token response: {e}")))?;
        Ok(token.into_session(unix_now()))
    }

    fn commit(&self, session: Session, event: fn(Session) -> AuthEvent) -> Session {
        self.set_current(Some(session.clone()));
        self.events.emit(&event(session.clone()));
        session
    }
}

#[async_trait::async_trait]
impl IdentityService for RemoteIdentity {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, IdentityError> {
        let body = serde_json::json!({ "email": credentials.email, "password": credentials.password });
        let session = self.token_grant("password", &body).await?;
        info!(user_id = %session.user_id(), "password sign-in accepted");
        Ok(self.commit(session, AuthEvent::SignedIn))
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        attributes: &SignUpAttributes,
    ) -> Result<Session, IdentityError> {
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
            "data": attributes,
        });
        let resp = self.post_auth("signup", None, &body).await?;
        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IdentityError::Transport(format!("unexpected sign-up response: {e}")))?;
        let session = parse_sign_up(value, &credentials.email, unix_now())?;
        info!(user_id = %session.user_id(), "sign-up accepted");
        Ok(self.commit(session, AuthEvent::SignedIn))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), IdentityError> {
        self.post_auth("logout", Some(&session.access_token), &serde_json::json!({}))
            .await?;
        self.set_current(None);
        self.events.emit(&AuthEvent::SignedOut);
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let session = self.token_grant("refresh_token", &body).await?;
        Ok(self.commit(session, AuthEvent::TokenRefreshed))
    }

    async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
        let Some(session) = self.current() else {
            return Ok(None);
        };
        if !session.is_expired_at(unix_now()) {
            return Ok(Some(session));
        }

        match self.refresh(&session.refresh_token).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(IdentityError::CredentialRejected(reason)) => {
                warn!(user_id = %session.user_id(), %reason, "expired session could not be refreshed");
                self.set_current(None);
                self.events.emit(&AuthEvent::SignedOut);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self) -> tokio::sync::mpsc::UnboundedReceiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait::async_trait]
impl ProfileSource for RemoteIdentity {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, IdentityError> {
        let bearer = self.current().map(|s| s.access_token);
        let resp = self
            .http
            .get(self.profile_url(user_id))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.as_deref().unwrap_or(&self.anon_key))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Transport(format!("profile query failed: {status}: {text}")));
        }

        let rows: Vec<Profile> = resp
            .json()
            .await
            .map_err(|e| IdentityError::Transport(format!("unexpected profile response: {e}")))?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
#[path = "remote_test.rs"]
mod tests;
