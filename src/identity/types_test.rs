use super::*;

fn session(id: Uuid) -> Session {
    Session {
        access_token: "secret-access".into(),
        refresh_token: "secret-refresh".into(),
        expires_at: Some(1_000),
        user: SessionUser { id, email: Some("bob@x.com".into()) },
    }
}

// =============================================================================
// IdentityError
// =============================================================================

#[test]
fn error_codes_are_stable() {
    assert_eq!(IdentityError::CredentialRejected("bad".into()).error_code(), "E_CREDENTIAL_REJECTED");
    assert_eq!(IdentityError::Transport("down".into()).error_code(), "E_TRANSPORT");
    assert_eq!(IdentityError::NotFound.error_code(), "E_NOT_FOUND");
}

#[test]
fn only_transport_is_retryable() {
    assert!(IdentityError::Transport("timeout".into()).retryable());
    assert!(!IdentityError::CredentialRejected("bad".into()).retryable());
    assert!(!IdentityError::NotFound.retryable());
}

#[test]
fn error_display_includes_message() {
    let err = IdentityError::CredentialRejected("Invalid login credentials".into());
    assert!(err.to_string().contains("Invalid login credentials"));
}

// =============================================================================
// Session
// =============================================================================

#[test]
fn session_debug_hides_tokens() {
    let debug = format!("{:?}", session(Uuid::nil()));
    assert!(!debug.contains("secret-access"));
    assert!(!debug.contains("secret-refresh"));
    assert!(debug.contains("bob@x.com"));
}

#[test]
fn same_principal_ignores_tokens() {
    let id = Uuid::new_v4();
    let a = session(id);
    let mut b = session(id);
    b.access_token = "rotated".into();
    assert!(a.same_principal(&b));
    assert!(!a.same_principal(&session(Uuid::new_v4())));
}

#[test]
fn expiry_is_inclusive() {
    let s = session(Uuid::nil());
    assert!(!s.is_expired_at(999));
    assert!(s.is_expired_at(1_000));
}

#[test]
fn session_without_expiry_never_expires() {
    let mut s = session(Uuid::nil());
    s.expires_at = None;
    assert!(!s.is_expired_at(u64::MAX));
}

#[test]
fn credentials_debug_hides_password() {
    let creds = Credentials { email: "a@b.c".into(), password: "hunter22".into() };
    assert!(!format!("{creds:?}").contains("hunter22"));
}

// =============================================================================
// Profile
// =============================================================================

#[test]
fn profile_reads_provider_flag() {
    let id = Uuid::new_v4();
    let json = serde_json::json!({"id": id, "username": "chef", "is_provider": true});
    let profile: Profile = serde_json::from_value(json).unwrap();
    assert!(profile.is_privileged);
    assert_eq!(profile.username.as_deref(), Some("chef"));
    assert!(profile.avatar_url.is_none());
}

#[test]
fn profile_missing_flag_is_not_privileged() {
    let json = serde_json::json!({"id": Uuid::nil()});
    let profile: Profile = serde_json::from_value(json).unwrap();
    assert!(!profile.is_privileged);
}

#[test]
fn profile_null_flag_keeps_profile_non_privileged() {
    let json = serde_json::json!({"id": Uuid::nil(), "username": "chef", "is_provider": null});
    let profile: Profile = serde_json::from_value(json).unwrap();
    assert!(!profile.is_privileged);
    assert_eq!(profile.username.as_deref(), Some("chef"));
}

// =============================================================================
// AuthEvent
// =============================================================================

#[test]
fn signed_out_leaves_no_session() {
    assert!(AuthEvent::SignedOut.into_session().is_none());
    assert_eq!(AuthEvent::SignedOut.name(), "SIGNED_OUT");
}

#[test]
fn refresh_carries_session() {
    let s = session(Uuid::nil());
    assert_eq!(AuthEvent::TokenRefreshed(s.clone()).into_session(), Some(s));
}
