//! Secondary identity provider: payment-network login used when no primary
//! session exists.
//!
//! Independent of the session store: it has its own user, loading flag and
//! last error, and never reads or writes the primary session.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::identity::{IdentityError, NetworkAuthenticator, NetworkUser};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSnapshot {
    pub user: Option<NetworkUser>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct NetworkLogin {
    authenticator: Option<Arc<dyn NetworkAuthenticator>>,
    state: Arc<watch::Sender<NetworkSnapshot>>,
}

impl NetworkLogin {
    /// `None` disables the provider: `login` then always fails.
    #[must_use]
    pub fn new(authenticator: Option<Arc<dyn NetworkAuthenticator>>) -> Self {
        let (tx, _) = watch::channel(NetworkSnapshot::default());
        Self { authenticator, state: Arc::new(tx) }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.authenticator.is_some()
    }

    #[must_use]
    pub fn snapshot(&self) -> NetworkSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<NetworkUser> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NetworkSnapshot> {
        self.state.subscribe()
    }

    /// Authenticate with the network and remember the user.
    ///
    /// # Errors
    ///
    /// Returns the authenticator's failure, or a transport error when the
    /// provider is not configured. The message is also kept in `error`.
    pub async fn login(&self) -> Result<NetworkUser, IdentityError> {
        let Some(authenticator) = &self.authenticator else {
            let err = IdentityError::Transport("network login is not configured".into());
            self.state.send_modify(|s| s.error = Some(err.to_string()));
            return Err(err);
        };

        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = authenticator.authenticate().await;

        self.state.send_modify(|s| {
            s.loading = false;
            match &result {
                Ok(user) => s.user = Some(user.clone()),
                Err(e) => s.error = Some(e.to_string()),
            }
        });

        match &result {
            Ok(user) => info!(uid = %user.uid, "network user signed in"),
            Err(e) => warn!(error = %e, "network login failed"),
        }
        result
    }

    /// Forget the network user locally.
    pub fn logout(&self) {
        let previous = self.state.send_replace(NetworkSnapshot::default());
        if let Some(user) = previous.user {
            info!(uid = %user.uid, "network user signed out");
        }
    }
}
