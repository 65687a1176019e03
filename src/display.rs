//! Display identity: one normalized view over the primary session and the
//! network user, for headers and user menus.
//!
//! DESIGN
//! ======
//! The primary session wins when both identities exist. The label falls
//! through a fixed order and always yields something non-empty:
//!
//! 1. profile username
//! 2. network username
//! 3. local part of the primary session email
//! 4. [`DEFAULT_DISPLAY_NAME`]

use serde::Serialize;

use crate::config::NavigationConfig;
use crate::identity::{NetworkUser, Profile, Session};

pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// The identity currently driving the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveIdentity {
    Primary(Session),
    Secondary(NetworkUser),
}

impl ActiveIdentity {
    #[must_use]
    pub fn select(primary: Option<&Session>, secondary: Option<&NetworkUser>) -> Option<Self> {
        match (primary, secondary) {
            (Some(session), _) => Some(Self::Primary(session.clone())),
            (None, Some(user)) => Some(Self::Secondary(user.clone())),
            (None, None) => None,
        }
    }

    #[must_use]
    pub fn source(&self) -> IdentitySource {
        match self {
            Self::Primary(_) => IdentitySource::Primary,
            Self::Secondary(_) => IdentitySource::Secondary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    Primary,
    Secondary,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn email_local_part(email: &str) -> Option<&str> {
    non_empty(email.split('@').next())
}

#[must_use]
pub fn display_name(profile: Option<&Profile>, secondary: Option<&NetworkUser>, primary: Option<&Session>) -> String {
    non_empty(profile.and_then(|p| p.username.as_deref()))
        .or_else(|| non_empty(secondary.and_then(|u| u.username.as_deref())))
        .or_else(|| primary.and_then(|s| s.user.email.as_deref()).and_then(email_local_part))
        .unwrap_or(DEFAULT_DISPLAY_NAME)
        .to_owned()
}

/// First two characters of `name`, uppercased.
#[must_use]
pub fn initials(name: &str) -> String {
    name.chars().take(2).flat_map(char::to_uppercase).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayIdentity {
    pub label: String,
    pub initials: String,
    pub avatar_url: Option<String>,
    pub source: IdentitySource,
    pub privileged: bool,
}

impl DisplayIdentity {
    /// `None` when neither identity is signed in.
    #[must_use]
    pub fn resolve(primary: Option<&Session>, profile: Option<&Profile>, secondary: Option<&NetworkUser>) -> Option<Self> {
        let active = ActiveIdentity::select(primary, secondary)?;
        let label = display_name(profile, secondary, primary);
        Some(Self {
            initials: initials(&label),
            label,
            avatar_url: profile
                .and_then(|p| p.avatar_url.clone())
                .filter(|url| !url.is_empty()),
            source: active.source(),
            privileged: profile.is_some_and(|p| p.is_privileged),
        })
    }
}

// =============================================================================
// USER MENU
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuEntry {
    Login { disabled: bool },
    Wallet,
    Rewards,
    Orders,
    AdminDashboard,
    Logout,
}

impl MenuEntry {
    /// Navigation target, `None` for action entries.
    #[must_use]
    pub fn path(&self, navigation: &NavigationConfig) -> Option<String> {
        match self {
            Self::Login { .. } => Some(navigation.login_path.clone()),
            Self::Wallet => Some("/wallet".into()),
            Self::Rewards => Some("/rewards".into()),
            Self::Orders => Some("/orders".into()),
            Self::AdminDashboard => Some(navigation.admin_landing_path.clone()),
            Self::Logout => None,
        }
    }
}

/// Entries for the header user menu. `loading` is true while either
/// identity provider is still working.
#[must_use]
pub fn user_menu(identity: Option<&DisplayIdentity>, loading: bool) -> Vec<MenuEntry> {
    let Some(identity) = identity else {
        return vec![MenuEntry::Login { disabled: loading }];
    };
    let mut entries = vec![MenuEntry::Wallet, MenuEntry::Rewards, MenuEntry::Orders];
    if identity.privileged {
        entries.push(MenuEntry::AdminDashboard);
    }
    entries.push(MenuEntry::Logout);
    entries
}

#[cfg(test)]
#[path = "display_test.rs"]
mod tests;
