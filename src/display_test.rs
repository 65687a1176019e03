use super::*;

use uuid::Uuid;

use crate::identity::SessionUser;

fn session(email: Option<&str>) -> Session {
    Session {
        access_token: "a".into(),
        refresh_token: "r".into(),
        expires_at: None,
        user: SessionUser { id: Uuid::new_v4(), email: email.map(Into::into) },
    }
}

fn profile(username: Option<&str>, privileged: bool) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        username: username.map(Into::into),
        full_name: None,
        avatar_url: Some("https://cdn.test/a.png".into()),
        is_privileged: privileged,
    }
}

fn network(username: Option<&str>) -> NetworkUser {
    NetworkUser { uid: "pi-1".into(), username: username.map(Into::into) }
}

// =============================================================================
// display_name fallback order
// =============================================================================

#[test]
fn profile_username_wins() {
    let name = display_name(
        Some(&profile(Some("chef"), false)),
        Some(&network(Some("alice"))),
        Some(&session(Some("bob@x.com"))),
    );
    assert_eq!(name, "chef");
}

#[test]
fn empty_profile_username_falls_to_network() {
    let name = display_name(
        Some(&profile(Some(""), false)),
        Some(&network(Some("alice"))),
        Some(&session(Some("bob@x.com"))),
    );
    assert_eq!(name, "alice");
}

#[test]
fn falls_to_email_local_part() {
    let name = display_name(None, Some(&network(None)), Some(&session(Some("bob@x.com"))));
    assert_eq!(name, "bob");
}

#[test]
fn whitespace_values_are_skipped() {
    let name = display_name(Some(&profile(Some("   "), false)), Some(&network(Some(" "))), Some(&session(Some("@x.com"))));
    assert_eq!(name, DEFAULT_DISPLAY_NAME);
}

#[test]
fn nothing_known_gives_default() {
    assert_eq!(display_name(None, None, None), DEFAULT_DISPLAY_NAME);
    assert_eq!(display_name(None, None, Some(&session(None))), DEFAULT_DISPLAY_NAME);
}

// =============================================================================
// initials
// =============================================================================

#[test]
fn initials_take_two_uppercased() {
    assert_eq!(initials("alice"), "AL");
    assert_eq!(initials("x"), "X");
    assert_eq!(initials(""), "");
}

#[test]
fn initials_handle_multibyte() {
    assert_eq!(initials("éric"), "ÉR");
}

// =============================================================================
// ActiveIdentity / DisplayIdentity
// =============================================================================

#[test]
fn primary_takes_precedence() {
    let s = session(Some("bob@x.com"));
    let active = ActiveIdentity::select(Some(&s), Some(&network(Some("alice")))).unwrap();
    assert_eq!(active, ActiveIdentity::Primary(s));
}

#[test]
fn secondary_used_without_primary() {
    let active = ActiveIdentity::select(None, Some(&network(Some("alice")))).unwrap();
    assert_eq!(active.source(), IdentitySource::Secondary);
}

#[test]
fn no_identity_resolves_none() {
    assert!(ActiveIdentity::select(None, None).is_none());
    assert!(DisplayIdentity::resolve(None, None, None).is_none());
}

#[test]
fn display_identity_from_profile() {
    let s = session(Some("bob@x.com"));
    let p = profile(Some("chef"), true);
    let identity = DisplayIdentity::resolve(Some(&s), Some(&p), None).unwrap();
    assert_eq!(identity.label, "chef");
    assert_eq!(identity.initials, "CH");
    assert_eq!(identity.avatar_url.as_deref(), Some("https://cdn.test/a.png"));
    assert_eq!(identity.source, IdentitySource::Primary);
    assert!(identity.privileged);
}

#[test]
fn display_identity_network_only_has_no_avatar() {
    let identity = DisplayIdentity::resolve(None, None, Some(&network(Some("alice")))).unwrap();
    assert_eq!(identity.label, "alice");
    assert!(identity.avatar_url.is_none());
    assert!(!identity.privileged);
}

// =============================================================================
// user_menu
// =============================================================================

#[test]
fn signed_out_menu_is_login_only() {
    assert_eq!(user_menu(None, false), vec![MenuEntry::Login { disabled: false }]);
    assert_eq!(user_menu(None, true), vec![MenuEntry::Login { disabled: true }]);
}

#[test]
fn admin_entry_only_for_privileged() {
    let s = session(Some("bob@x.com"));
    let regular = DisplayIdentity::resolve(Some(&s), Some(&profile(None, false)), None).unwrap();
    let admin = DisplayIdentity::resolve(Some(&s), Some(&profile(None, true)), None).unwrap();

    assert!(!user_menu(Some(&regular), false).contains(&MenuEntry::AdminDashboard));
    assert_eq!(
        user_menu(Some(&admin), false),
        vec![MenuEntry::Wallet, MenuEntry::Rewards, MenuEntry::Orders, MenuEntry::AdminDashboard, MenuEntry::Logout]
    );
}

#[test]
fn menu_paths_follow_navigation() {
    let nav = NavigationConfig::default();
    assert_eq!(MenuEntry::Login { disabled: false }.path(&nav).as_deref(), Some("/auth"));
    assert_eq!(MenuEntry::AdminDashboard.path(&nav).as_deref(), Some("/admin"));
    assert_eq!(MenuEntry::Wallet.path(&nav).as_deref(), Some("/wallet"));
    assert!(MenuEntry::Logout.path(&nav).is_none());
}
