//! Shared application context.
//!
//! DESIGN
//! ======
//! `AppContext` is the dependency-injection root: it owns the session store,
//! role tracker and network login, and hands out gates and display
//! identities. It is injected into Axum handlers via the `State` extractor.
//! Clones share the same store, tracker and network login.

use std::sync::Arc;

use tracing::debug;

use crate::config::NavigationConfig;
use crate::display::{DisplayIdentity, MenuEntry, user_menu};
use crate::identity::{Credentials, IdentityError, IdentityService, NetworkAuthenticator, ProfileSource};
use crate::services::admin::{self, AdminLogin, AdminLoginError};
use crate::services::gate::{AuthGate, Surface};
use crate::services::network_login::NetworkLogin;
use crate::services::role::{RoleResolver, RoleTracker};
use crate::services::session::SessionStore;

#[derive(Clone)]
pub struct AppContext {
    pub store: SessionStore,
    pub roles: RoleTracker,
    pub resolver: RoleResolver,
    pub network: NetworkLogin,
    pub navigation: NavigationConfig,
}

impl AppContext {
    /// Wire the auth core together. Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityService>,
        profiles: Arc<dyn ProfileSource>,
        network: Option<Arc<dyn NetworkAuthenticator>>,
        navigation: NavigationConfig,
    ) -> Self {
        let store = SessionStore::start(identity);
        let resolver = RoleResolver::new(profiles);
        let roles = RoleTracker::start(&store, resolver.clone());
        Self { store, roles, resolver, network: NetworkLogin::new(network), navigation }
    }

    #[must_use]
    pub fn gate(&self, surface: Surface) -> AuthGate {
        AuthGate::new(surface, self.store.subscribe(), self.roles.subscribe(), self.navigation.clone())
    }

    /// Normalized identity for the header, `None` when nobody is signed in.
    #[must_use]
    pub fn display_identity(&self) -> Option<DisplayIdentity> {
        let session = self.store.session();
        let role = self.roles.snapshot();
        // The profile only describes the current session once the tracker
        // has caught up with it.
        let profile = role
            .profile
            .as_ref()
            .filter(|_| role.generation == self.store.snapshot().generation);
        DisplayIdentity::resolve(session.as_ref(), profile, self.network.user().as_ref())
    }

    #[must_use]
    pub fn user_menu(&self) -> Vec<MenuEntry> {
        let loading = self.store.is_loading() || self.network.is_loading();
        user_menu(self.display_identity().as_ref(), loading)
    }

    /// Sign out whichever identity is active: the primary session if present,
    /// otherwise the network user.
    ///
    /// # Errors
    ///
    /// Propagates a failed primary sign-out; the session is kept in that case.
    pub async fn logout_active(&self) -> Result<(), IdentityError> {
        if self.store.session().is_some() {
            return self.store.sign_out().await;
        }
        if self.network.user().is_some() {
            self.network.logout();
            return Ok(());
        }
        debug!("logout requested with no active identity");
        Ok(())
    }

    /// # Errors
    ///
    /// See [`admin::admin_login`].
    pub async fn admin_login(&self, credentials: &Credentials) -> Result<AdminLogin, AdminLoginError> {
        admin::admin_login(&self.store, &self.resolver, credentials, &self.navigation).await
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
