//! Session store, the single owner of the client-side "current session".
//!
//! ARCHITECTURE
//! ============
//! The store is an owned instance injected through `AppContext`. Its state
//! lives in a `watch` channel whose sender only the store (and its listener
//! task) can reach; every other component registers as an observer through
//! [`SessionStore::subscribe`] and re-derives its own state on change.
//!
//! STARTUP ORDERING
//! ================
//! The listener registers for change notifications before running the
//! one-time current-session probe. The probe result is applied first, and
//! that is the only place `loading` is cleared. Notifications that arrived
//! meanwhile sit in the channel and are applied afterwards in emission order.
//! `loading` starts true and never returns to true for the life of a store.
//!
//! LOCAL COMMITS
//! =============
//! The identity service echoes every operation the store performs as an
//! event, queued before the operation returns. A local commit first drains
//! and applies whatever is queued, then applies its own result, inside one
//! `watch` update. Echoes of earlier operations therefore never replay on
//! top of a newer local result. Lock order is always receiver, then state.
//!
//! GENERATIONS
//! ===========
//! Every change of principal (including to or from "no session") bumps
//! `generation`. Token rotation for the same principal replaces the session
//! without bumping it. Downstream async work tags its results with the
//! generation it started under and discards them if the store has moved on.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::Poll;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::identity::{AuthEvent, Credentials, IdentityError, IdentityService, Session, SignUpAttributes};

/// Point-in-time view of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub loading: bool,
    pub generation: u64,
}

impl SessionSnapshot {
    #[must_use]
    pub fn initial() -> Self {
        Self { session: None, loading: true, generation: 0 }
    }
}

/// Apply `next` as the current session. Returns whether observers must be notified.
fn apply(snap: &mut SessionSnapshot, next: Option<Session>) -> bool {
    if snap.session == next {
        return false;
    }
    let same_principal = match (&snap.session, &next) {
        (Some(current), Some(incoming)) => current.same_principal(incoming),
        _ => false,
    };
    snap.session = next;
    if !same_principal {
        snap.generation += 1;
    }
    true
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

type EventQueue = Arc<Mutex<mpsc::UnboundedReceiver<AuthEvent>>>;

struct StoreInner {
    identity: Arc<dyn IdentityService>,
    state: Arc<watch::Sender<SessionSnapshot>>,
    events: EventQueue,
    listener: JoinHandle<()>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl SessionStore {
    /// Create a store bound to `identity` and start listening for changes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(identity: Arc<dyn IdentityService>) -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::initial());
        let state = Arc::new(tx);
        let events = Arc::new(Mutex::new(identity.subscribe()));
        let listener = tokio::spawn(listen(Arc::clone(&identity), Arc::clone(&state), Arc::clone(&events)));
        Self { inner: Arc::new(StoreInner { identity, state, events, listener }) }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner.state.borrow().session.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Register an observer. The receiver sees the current snapshot immediately.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Wait for the first authoritative answer and return the snapshot at that point.
    pub async fn ready(&self) -> SessionSnapshot {
        let mut rx = self.subscribe();
        match rx.wait_for(|snap| !snap.loading).await {
            Ok(snap) => snap.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Propagates the identity service's rejection or transport failure; the
    /// cached session is left untouched in that case.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, IdentityError> {
        let session = self
            .inner
            .identity
            .sign_in(credentials)
            .await
            .inspect_err(|e| warn!(error = %e, code = e.error_code(), "sign-in failed"))?;
        self.commit(Some(session.clone()));
        info!(user_id = %session.user_id(), "signed in");
        Ok(session)
    }

    /// Register a new account and sign in as it.
    ///
    /// # Errors
    ///
    /// Same contract as [`SessionStore::sign_in`].
    pub async fn sign_up(&self, credentials: &Credentials, attributes: &SignUpAttributes) -> Result<Session, IdentityError> {
        let session = self
            .inner
            .identity
            .sign_up(credentials, attributes)
            .await
            .inspect_err(|e| warn!(error = %e, code = e.error_code(), "sign-up failed"))?;
        self.commit(Some(session.clone()));
        info!(user_id = %session.user_id(), username = %attributes.username, "signed up");
        Ok(session)
    }

    /// Restore a session from a persisted refresh token.
    ///
    /// # Errors
    ///
    /// Same contract as [`SessionStore::sign_in`].
    pub async fn restore(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        let session = self
            .inner
            .identity
            .refresh(refresh_token)
            .await
            .inspect_err(|e| warn!(error = %e, "session restore failed"))?;
        self.commit(Some(session.clone()));
        info!(user_id = %session.user_id(), "session restored");
        Ok(session)
    }

    /// Sign out remotely, then clear the cached session.
    ///
    /// # Errors
    ///
    /// If the remote call fails the error is returned and the cached session
    /// is kept.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        let Some(session) = self.session() else {
            debug!("sign-out requested without a session");
            return Ok(());
        };
        self.inner
            .identity
            .sign_out(&session)
            .await
            .inspect_err(|e| warn!(error = %e, user_id = %session.user_id(), "sign-out failed; session kept"))?;
        self.commit(None);
        info!(user_id = %session.user_id(), "signed out");
        Ok(())
    }

    fn commit(&self, session: Option<Session>) {
        let mut events = lock(&self.inner.events);
        self.inner.state.send_if_modified(|snap| {
            let mut changed = false;
            while let Ok(event) = events.try_recv() {
                debug!(event = event.name(), "folding queued auth event into local commit");
                changed |= apply(snap, event.into_session());
            }
            changed | apply(snap, session)
        });
    }
}

fn lock(events: &EventQueue) -> MutexGuard<'_, mpsc::UnboundedReceiver<AuthEvent>> {
    events.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn listen(
    identity: Arc<dyn IdentityService>,
    state: Arc<watch::Sender<SessionSnapshot>>,
    events: EventQueue,
) {
    let probed_at = state.borrow().generation;
    let probe = identity.current_session().await;
    drop(identity);

    state.send_modify(|snap| {
        match probe {
            Ok(session) if snap.generation == probed_at => {
                apply(snap, session);
            }
            Ok(_) => debug!("current-session probe superseded by a local change"),
            Err(e) => warn!(error = %e, "current-session probe failed; treating as signed out"),
        }
        snap.loading = false;
    });

    // The event is applied while the receiver is still locked so a
    // concurrent commit cannot slip in between receipt and application.
    loop {
        let open = std::future::poll_fn(|cx| {
            let mut rx = lock(&events);
            match rx.poll_recv(cx) {
                Poll::Ready(Some(event)) => {
                    debug!(event = event.name(), "applying auth event");
                    state.send_if_modified(|snap| apply(snap, event.into_session()));
                    Poll::Ready(true)
                }
                Poll::Ready(None) => Poll::Ready(false),
                Poll::Pending => Poll::Pending,
            }
        })
        .await;
        if !open {
            break;
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
