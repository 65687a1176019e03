//! Role resolution: is the signed-in user allowed onto admin surfaces?
//!
//! DESIGN
//! ======
//! `RoleResolver` is the single-shot check: one profile fetch for one
//! session. Every failure path (missing record, transport error, decode
//! error) resolves to `NonPrivileged`; nothing fails open.
//!
//! `RoleTracker` runs the resolver reactively. It observes the session store
//! and starts one fetch per session generation. A finished fetch is applied
//! only if the store is still on the generation it was started for, so a late
//! answer for a previous user can never set the decision for the current one.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::session::{SessionSnapshot, SessionStore};
use crate::identity::{Profile, ProfileSource, Session};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    NonPrivileged,
    Privileged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleDecision {
    Pending,
    Resolved(Privilege),
}

/// Record of a signed-in administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl AdminUser {
    #[must_use]
    pub fn for_session(session: &Session) -> Self {
        Self {
            id: session.user_id(),
            email: session.user.email.clone().unwrap_or_default(),
            role: ADMIN_ROLE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleResolution {
    pub privilege: Privilege,
    pub profile: Option<Profile>,
}

// =============================================================================
// RESOLVER
// =============================================================================

#[derive(Clone)]
pub struct RoleResolver {
    profiles: Arc<dyn ProfileSource>,
}

impl RoleResolver {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileSource>) -> Self {
        Self { profiles }
    }

    /// Fetch the profile for `session` and derive its privilege. Never errors.
    pub async fn resolve(&self, session: &Session) -> RoleResolution {
        let user_id = session.user_id();
        match self.profiles.fetch_profile(user_id).await {
            Ok(Some(profile)) => {
                let privilege = if profile.is_privileged { Privilege::Privileged } else { Privilege::NonPrivileged };
                debug!(%user_id, ?privilege, "profile resolved");
                RoleResolution { privilege, profile: Some(profile) }
            }
            Ok(None) => {
                debug!(%user_id, "no profile record");
                RoleResolution { privilege: Privilege::NonPrivileged, profile: None }
            }
            Err(e) => {
                warn!(%user_id, error = %e, "profile lookup failed; treating as non-privileged");
                RoleResolution { privilege: Privilege::NonPrivileged, profile: None }
            }
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Role state derived for one session generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSnapshot {
    pub generation: u64,
    pub decision: RoleDecision,
    pub profile: Option<Profile>,
    pub admin_user: Option<AdminUser>,
}

impl RoleSnapshot {
    #[must_use]
    pub fn pending(generation: u64) -> Self {
        Self { generation, decision: RoleDecision::Pending, profile: None, admin_user: None }
    }

    #[must_use]
    pub fn signed_out(generation: u64) -> Self {
        Self {
            generation,
            decision: RoleDecision::Resolved(Privilege::NonPrivileged),
            profile: None,
            admin_user: None,
        }
    }

    #[must_use]
    pub fn resolved(generation: u64, session: &Session, resolution: RoleResolution) -> Self {
        let admin_user = (resolution.privilege == Privilege::Privileged).then(|| AdminUser::for_session(session));
        Self {
            generation,
            decision: RoleDecision::Resolved(resolution.privilege),
            profile: resolution.profile,
            admin_user,
        }
    }

    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.decision == RoleDecision::Resolved(Privilege::Privileged)
    }
}

// =============================================================================
// TRACKER
// =============================================================================

#[derive(Clone)]
pub struct RoleTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    state: Arc<watch::Sender<RoleSnapshot>>,
    task: JoinHandle<()>,
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl RoleTracker {
    /// Start tracking `store`. Must be called from within a Tokio runtime.
    pub fn start(store: &SessionStore, resolver: RoleResolver) -> Self {
        let (tx, _) = watch::channel(RoleSnapshot::signed_out(0));
        let state = Arc::new(tx);
        let task = tokio::spawn(track(store.subscribe(), resolver, Arc::clone(&state)));
        Self { inner: Arc::new(TrackerInner { state, task }) }
    }

    #[must_use]
    pub fn snapshot(&self) -> RoleSnapshot {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RoleSnapshot> {
        self.inner.state.subscribe()
    }
}

async fn track(mut sessions: watch::Receiver<SessionSnapshot>, resolver: RoleResolver, state: Arc<watch::Sender<RoleSnapshot>>) {
    let mut handled: Option<u64> = None;
    loop {
        let snap = sessions.borrow_and_update().clone();
        if handled != Some(snap.generation) {
            handled = Some(snap.generation);
            on_generation(snap, &sessions, &resolver, &state);
        }
        if sessions.changed().await.is_err() {
            break;
        }
    }
}

fn on_generation(
    snap: SessionSnapshot,
    sessions: &watch::Receiver<SessionSnapshot>,
    resolver: &RoleResolver,
    state: &Arc<watch::Sender<RoleSnapshot>>,
) {
    let generation = snap.generation;
    let Some(session) = snap.session else {
        state.send_replace(RoleSnapshot::signed_out(generation));
        return;
    };

    state.send_replace(RoleSnapshot::pending(generation));

    let sessions = sessions.clone();
    let resolver = resolver.clone();
    let state = Arc::clone(state);
    tokio::spawn(async move {
        let resolution = resolver.resolve(&session).await;

        let current = sessions.borrow().generation;
        if current != generation {
            debug!(user_id = %session.user_id(), generation, current, "discarding stale role result");
            return;
        }

        let applied = state.send_if_modified(|role| {
            if role.generation != generation {
                return false;
            }
            *role = RoleSnapshot::resolved(generation, &session, resolution);
            true
        });
        if applied {
            info!(user_id = %session.user_id(), generation, "role decision applied");
        }
    });
}

#[cfg(test)]
#[path = "role_test.rs"]
mod tests;
