use super::*;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::state::test_helpers::{MockIdentity, MockProfiles, ProfileReply, creds, profile, settle, within};

struct Fixture {
    identity: Arc<MockIdentity>,
    profiles: Arc<MockProfiles>,
    store: SessionStore,
    resolver: RoleResolver,
    nav: NavigationConfig,
}

async fn fixture() -> Fixture {
    let identity = Arc::new(MockIdentity::new());
    let profiles = Arc::new(MockProfiles::new());
    let store = SessionStore::start(identity.clone());
    within(store.ready()).await;
    let resolver = RoleResolver::new(profiles.clone());
    Fixture { identity, profiles, store, resolver, nav: NavigationConfig::default() }
}

#[tokio::test]
async fn privileged_account_lands_on_dashboard() {
    let f = fixture().await;
    let id = f.identity.register("chef@x.com");
    f.profiles.reply(id, ProfileReply::Found(profile(id, Some("chef"), true)));

    let login = admin_login(&f.store, &f.resolver, &creds("chef@x.com"), &f.nav).await.unwrap();
    assert_eq!(login.redirect_to, "/admin");
    assert_eq!(login.admin_user, AdminUser { id, email: "chef@x.com".into(), role: "admin".into() });
    assert_eq!(f.store.session().unwrap().user_id(), id);
}

#[tokio::test]
async fn non_privileged_account_is_signed_back_out() {
    let f = fixture().await;
    let id = f.identity.register("bob@x.com");
    f.profiles.reply(id, ProfileReply::Found(profile(id, Some("bob"), false)));

    let err = admin_login(&f.store, &f.resolver, &creds("bob@x.com"), &f.nav).await.unwrap_err();
    assert!(matches!(err, AdminLoginError::NotPrivileged));
    assert_eq!(err.error_code(), "E_NOT_PRIVILEGED");

    settle().await;
    assert!(f.store.session().is_none());
}

#[tokio::test]
async fn failed_sign_out_after_refusal_is_reported() {
    let f = fixture().await;
    let id = f.identity.register("bob@x.com");
    f.profiles.reply(id, ProfileReply::Found(profile(id, Some("bob"), false)));
    f.identity.fail_sign_out.store(true, Ordering::SeqCst);

    let err = admin_login(&f.store, &f.resolver, &creds("bob@x.com"), &f.nav).await.unwrap_err();
    assert!(matches!(err, AdminLoginError::NotPrivilegedSessionKept(IdentityError::Transport(_))));
    assert_eq!(err.error_code(), "E_NOT_PRIVILEGED_SESSION_KEPT");
    assert_eq!(f.store.session().unwrap().user_id(), id);
}

#[tokio::test]
async fn profile_failure_refuses_access() {
    let f = fixture().await;
    let id = f.identity.register("chef@x.com");
    f.profiles.reply(id, ProfileReply::Fail);

    let err = admin_login(&f.store, &f.resolver, &creds("chef@x.com"), &f.nav).await.unwrap_err();
    assert!(matches!(err, AdminLoginError::NotPrivileged));
    assert!(f.store.session().is_none());
}

#[tokio::test]
async fn bad_credentials_surface_identity_error() {
    let f = fixture().await;
    f.identity.register("chef@x.com");

    let mut wrong = creds("chef@x.com");
    wrong.password = "nope-nope".into();
    let err = admin_login(&f.store, &f.resolver, &wrong, &f.nav).await.unwrap_err();
    assert!(matches!(err, AdminLoginError::Identity(IdentityError::CredentialRejected(_))));
    assert_eq!(f.profiles.call_count(), 0);
    assert!(f.store.session().is_none());
}

#[tokio::test]
async fn landing_path_is_configurable() {
    let mut f = fixture().await;
    f.nav.admin_landing_path = "/back-office".into();
    let id = f.identity.register("chef@x.com");
    f.profiles.reply(id, ProfileReply::Found(profile(id, None, true)));

    let login = admin_login(&f.store, &f.resolver, &creds("chef@x.com"), &f.nav).await.unwrap();
    assert_eq!(login.redirect_to, "/back-office");
}
