//! Identity types shared by the session store, role resolver and providers.
//!
//! These mirror the wire shapes of the hosted identity service closely enough
//! to deserialize its responses, but carry only what the auth core consumes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by identity-service and network-provider calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The service refused the supplied credentials or token.
    #[error("credentials rejected: {0}")]
    CredentialRejected(String),

    /// The request never produced a usable answer (network, status, decode).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The requested record does not exist.
    #[error("not found")]
    NotFound,

    /// Sign-up succeeded but the account must be confirmed before a session exists.
    #[error("confirmation required for {email}")]
    ConfirmationRequired { email: String },
}

impl IdentityError {
    /// Stable machine-readable code for surfacing to the presentation layer.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CredentialRejected(_) => "E_CREDENTIAL_REJECTED",
            Self::Transport(_) => "E_TRANSPORT",
            Self::NotFound => "E_NOT_FOUND",
            Self::ConfirmationRequired { .. } => "E_CONFIRMATION_REQUIRED",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// The principal a session was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session issued by the identity service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry in seconds since the Unix epoch, when the service reports one.
    pub expires_at: Option<u64>,
    pub user: SessionUser,
}

impl Session {
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    /// Whether both sessions belong to the same principal.
    #[must_use]
    pub fn same_principal(&self, other: &Session) -> bool {
        self.user.id == other.user.id
    }

    /// Whether the session has expired at `now` (seconds since epoch).
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Email/password pair. Build through [`crate::validation`] to get normalized input.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("email", &self.email).finish_non_exhaustive()
    }
}

/// Extra user metadata submitted at sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpAttributes {
    pub username: String,
    pub full_name: String,
}

// =============================================================================
// PROFILE
// =============================================================================

/// Row from the `profiles` table keyed by session user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Providers double as back-office administrators. A null column reads as `false`.
    #[serde(default, rename = "is_provider", deserialize_with = "null_as_false")]
    pub is_privileged: bool,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

// =============================================================================
// AUTH EVENTS
// =============================================================================

/// Change notification emitted by an identity service, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl AuthEvent {
    /// The session this event leaves behind, `None` after sign-out.
    #[must_use]
    pub fn into_session(self) -> Option<Session> {
        match self {
            Self::SignedIn(s) | Self::TokenRefreshed(s) => Some(s),
            Self::SignedOut => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "SIGNED_IN",
            Self::TokenRefreshed(_) => "TOKEN_REFRESHED",
            Self::SignedOut => "SIGNED_OUT",
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
