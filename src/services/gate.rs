//! Auth gate: what a protected surface may show right now.
//!
//! `evaluate` is the pure state function; `decide` maps a state onto a
//! surface policy. `AuthGate` wires both to the live session and role
//! channels so a surface can await resolution and observe re-entry into
//! `Loading` after any session change.

use serde::Serialize;
use tokio::sync::watch;

use super::role::{Privilege, RoleDecision, RoleSnapshot};
use super::session::SessionSnapshot;
use crate::config::NavigationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Loading,
    Unauthenticated,
    Authenticated(Privilege),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Any signed-in user may enter.
    General,
    /// Only privileged users may enter.
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    ShowLoading,
    Redirect(String),
    Render,
}

/// Derive the gate state from the current session and role snapshots.
///
/// `Loading` while the store has not answered, or while a session exists
/// whose role has not been resolved for that session's generation.
#[must_use]
pub fn evaluate(session: &SessionSnapshot, role: &RoleSnapshot) -> GateState {
    if session.loading {
        return GateState::Loading;
    }
    if session.session.is_none() {
        return GateState::Unauthenticated;
    }
    if role.generation != session.generation {
        return GateState::Loading;
    }
    match role.decision {
        RoleDecision::Pending => GateState::Loading,
        RoleDecision::Resolved(privilege) => GateState::Authenticated(privilege),
    }
}

/// Apply a surface's access policy to a gate state.
#[must_use]
pub fn decide(surface: Surface, state: GateState, navigation: &NavigationConfig) -> GateOutcome {
    match (surface, state) {
        (_, GateState::Loading) => GateOutcome::ShowLoading,
        (Surface::General, GateState::Unauthenticated) => GateOutcome::Redirect(navigation.login_path.clone()),
        (Surface::General, GateState::Authenticated(_)) | (Surface::Admin, GateState::Authenticated(Privilege::Privileged)) => {
            GateOutcome::Render
        }
        (Surface::Admin, GateState::Unauthenticated | GateState::Authenticated(Privilege::NonPrivileged)) => {
            GateOutcome::Redirect(navigation.admin_login_path.clone())
        }
    }
}

/// Gate instance for one protected surface.
pub struct AuthGate {
    surface: Surface,
    sessions: watch::Receiver<SessionSnapshot>,
    roles: watch::Receiver<RoleSnapshot>,
    navigation: NavigationConfig,
}

impl AuthGate {
    #[must_use]
    pub fn new(
        surface: Surface,
        sessions: watch::Receiver<SessionSnapshot>,
        roles: watch::Receiver<RoleSnapshot>,
        navigation: NavigationConfig,
    ) -> Self {
        Self { surface, sessions, roles, navigation }
    }

    #[must_use]
    pub fn surface(&self) -> Surface {
        self.surface
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        evaluate(&self.sessions.borrow(), &self.roles.borrow())
    }

    #[must_use]
    pub fn outcome(&self) -> GateOutcome {
        decide(self.surface, self.state(), &self.navigation)
    }

    /// Wait until the gate leaves `Loading` and return the resolved state.
    ///
    /// Returns the last observed state if either channel closes first.
    pub async fn resolved(&mut self) -> GateState {
        loop {
            let state = self.observe();
            if state != GateState::Loading {
                return state;
            }
            if !self.wait_for_change().await {
                return state;
            }
        }
    }

    /// Wait for the next session or role change and return the state after it.
    pub async fn changed(&mut self) -> GateState {
        self.observe();
        self.wait_for_change().await;
        self.observe()
    }

    fn observe(&mut self) -> GateState {
        let session = self.sessions.borrow_and_update().clone();
        let role = self.roles.borrow_and_update().clone();
        evaluate(&session, &role)
    }

    async fn wait_for_change(&mut self) -> bool {
        tokio::select! {
            r = self.sessions.changed() => r.is_ok(),
            r = self.roles.changed() => r.is_ok(),
        }
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
