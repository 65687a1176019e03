//! Adapters for the hosted identity service and the payment network login.
//!
//! DESIGN
//! ======
//! The auth core only talks to the traits defined here. `RemoteIdentity`
//! implements them against a GoTrue/PostgREST-compatible backend, and
//! `PiNetwork` implements the secondary network login. Tests substitute
//! in-memory mocks.
//!
//! Change notifications are delivered through explicit observer registration
//! (`subscribe`), one unbounded channel per observer, so every observer sees
//! every event in emission order.

pub mod network;
pub mod remote;
pub mod types;

use std::sync::Mutex;

use tokio::sync::mpsc;
use uuid::Uuid;

pub use network::{NetworkAuthenticator, NetworkUser, PiNetwork};
pub use remote::RemoteIdentity;
pub use types::{AuthEvent, Credentials, IdentityError, Profile, Session, SessionUser, SignUpAttributes};

// =============================================================================
// TRAITS
// =============================================================================

/// Session issuance and change notifications.
#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, IdentityError>;

    /// Register a new account and return its first session.
    async fn sign_up(&self, credentials: &Credentials, attributes: &SignUpAttributes)
    -> Result<Session, IdentityError>;

    /// Revoke the given session remotely.
    async fn sign_out(&self, session: &Session) -> Result<(), IdentityError>;

    /// Exchange a persisted refresh token for a fresh session.
    async fn refresh(&self, refresh_token: &str) -> Result<Session, IdentityError>;

    /// One-time probe for the session the service currently holds.
    async fn current_session(&self) -> Result<Option<Session>, IdentityError>;

    /// Register an observer for change notifications.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<AuthEvent>;
}

/// Read access to user-attribute records.
#[async_trait::async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the profile for `user_id`. `Ok(None)` when no record exists.
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, IdentityError>;
}

// =============================================================================
// EVENT HUB
// =============================================================================

/// Fan-out of auth events to registered observers.
///
/// Observers whose receiver has been dropped are pruned on the next emit.
#[derive(Default)]
pub struct AuthEvents {
    observers: Mutex<Vec<mpsc::UnboundedSender<AuthEvent>>>,
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<AuthEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    pub fn emit(&self, event: &AuthEvent) {
        tracing::debug!(event = event.name(), "auth event");
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<AuthEvent>>> {
        // Poisoning is ignored: every mutation leaves the Vec consistent.
        self.observers.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reaches_every_observer_in_order() {
        let hub = AuthEvents::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        hub.emit(&AuthEvent::SignedOut);
        let session = Session {
            access_token: "t".into(),
            refresh_token: "r".into(),
            expires_at: None,
            user: SessionUser { id: Uuid::nil(), email: None },
        };
        hub.emit(&AuthEvent::SignedIn(session.clone()));

        for rx in [&mut a, &mut b] {
            assert_eq!(rx.try_recv().unwrap(), AuthEvent::SignedOut);
            assert_eq!(rx.try_recv().unwrap(), AuthEvent::SignedIn(session.clone()));
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn dropped_observers_are_pruned() {
        let hub = AuthEvents::new();
        let keep = hub.subscribe();
        drop(hub.subscribe());
        assert_eq!(hub.observer_count(), 2);

        hub.emit(&AuthEvent::SignedOut);
        assert_eq!(hub.observer_count(), 1);
        drop(keep);
    }
}
