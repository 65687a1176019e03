//! Admin back-office login.
//!
//! Signs in through the session store, then checks the role for the new
//! session directly (not through the tracker) so the caller gets a definite
//! answer. A valid account without the privilege flag is signed straight
//! back out.

use serde::Serialize;
use tracing::{info, warn};

use super::role::{AdminUser, Privilege, RoleResolver};
use super::session::SessionStore;
use crate::config::NavigationConfig;
use crate::identity::{Credentials, IdentityError};

#[derive(Debug, thiserror::Error)]
pub enum AdminLoginError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("account does not have administrator access")]
    NotPrivileged,
    /// Refused as `NotPrivileged`, but signing the session back out failed.
    #[error("account does not have administrator access; its session is still signed in: {0}")]
    NotPrivilegedSessionKept(IdentityError),
}

impl AdminLoginError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Identity(e) => e.error_code(),
            Self::NotPrivileged => "E_NOT_PRIVILEGED",
            Self::NotPrivilegedSessionKept(_) => "E_NOT_PRIVILEGED_SESSION_KEPT",
        }
    }
}

/// Successful admin login: who signed in and where to send them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminLogin {
    pub admin_user: AdminUser,
    pub redirect_to: String,
}

/// Sign in and require the privilege flag.
///
/// # Errors
///
/// - `Identity` when sign-in itself fails; no session is committed.
/// - `NotPrivileged` when the account is valid but not an administrator, or
///   its profile could not be read. The session is signed out again.
/// - `NotPrivilegedSessionKept` when the account is refused as above but the
///   sign-out fails. The non-privileged session stays committed.
pub async fn admin_login(
    store: &SessionStore,
    resolver: &RoleResolver,
    credentials: &Credentials,
    navigation: &NavigationConfig,
) -> Result<AdminLogin, AdminLoginError> {
    let session = store.sign_in(credentials).await?;
    let resolution = resolver.resolve(&session).await;

    if resolution.privilege == Privilege::Privileged {
        info!(user_id = %session.user_id(), "admin signed in");
        return Ok(AdminLogin {
            admin_user: AdminUser::for_session(&session),
            redirect_to: navigation.admin_landing_path.clone(),
        });
    }

    warn!(user_id = %session.user_id(), "admin login refused: not privileged");
    if let Err(e) = store.sign_out().await {
        warn!(error = %e, user_id = %session.user_id(), "sign-out after refused admin login failed");
        return Err(AdminLoginError::NotPrivilegedSessionKept(e));
    }
    Err(AdminLoginError::NotPrivileged)
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
