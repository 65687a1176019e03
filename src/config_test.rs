use super::*;

use std::sync::Mutex;

// Env is process-global; serialize the tests that touch it.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: &[&str] = &[
    "IDENTITY_URL",
    "IDENTITY_ANON_KEY",
    "IDENTITY_REFRESH_TOKEN",
    "PI_API_URL",
    "PI_ACCESS_TOKEN",
    "LOGIN_PATH",
    "ADMIN_LOGIN_PATH",
    "ADMIN_LANDING_PATH",
    "HTTP_TIMEOUT_SECS",
    "BIND_ADDR",
    "PORT",
];

/// # Safety
/// Callers hold `ENV_LOCK` so no other test reads the environment concurrently.
unsafe fn clear_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

/// # Safety
/// Same as [`clear_env`].
unsafe fn set_required() {
    unsafe {
        std::env::set_var("IDENTITY_URL", "https://project.example.co/");
        std::env::set_var("IDENTITY_ANON_KEY", "anon");
    }
}

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        set_required();
    }

    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.identity.base_url, "https://project.example.co");
    assert_eq!(cfg.identity.anon_key, "anon");
    assert_eq!(cfg.identity.timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    assert!(cfg.network.is_none());
    assert_eq!(cfg.navigation, NavigationConfig::default());
    assert!(cfg.refresh_token.is_none());
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
    assert!(cfg.bind_addr.is_loopback());

    unsafe { clear_env() };
}

#[test]
fn from_env_reads_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        set_required();
        std::env::set_var("PI_ACCESS_TOKEN", "pi-token");
        std::env::set_var("PI_API_URL", "https://sandbox.minepi.test/");
        std::env::set_var("LOGIN_PATH", "/signin");
        std::env::set_var("ADMIN_LANDING_PATH", "/backoffice");
        std::env::set_var("HTTP_TIMEOUT_SECS", "3");
        std::env::set_var("PORT", "8080");
        std::env::set_var("BIND_ADDR", "0.0.0.0");
        std::env::set_var("IDENTITY_REFRESH_TOKEN", "persisted");
    }

    let cfg = AppConfig::from_env().unwrap();
    let network = cfg.network.unwrap();
    assert_eq!(network.base_url, "https://sandbox.minepi.test");
    assert_eq!(network.access_token, "pi-token");
    assert_eq!(network.timeout, Duration::from_secs(3));
    assert_eq!(cfg.navigation.login_path, "/signin");
    assert_eq!(cfg.navigation.admin_login_path, DEFAULT_ADMIN_LOGIN_PATH);
    assert_eq!(cfg.navigation.admin_landing_path, "/backoffice");
    assert_eq!(cfg.refresh_token.as_deref(), Some("persisted"));
    assert_eq!(cfg.port, 8080);
    assert!(cfg.bind_addr.is_unspecified());

    unsafe { clear_env() };
}

#[test]
fn from_env_missing_url_errors() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("IDENTITY_ANON_KEY", "anon");
    }

    assert_eq!(AppConfig::from_env().unwrap_err(), ConfigError::Missing { var: "IDENTITY_URL" });

    unsafe { clear_env() };
}

#[test]
fn from_env_blank_key_counts_as_missing() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("IDENTITY_URL", "https://project.example.co");
        std::env::set_var("IDENTITY_ANON_KEY", "   ");
    }

    assert_eq!(AppConfig::from_env().unwrap_err(), ConfigError::Missing { var: "IDENTITY_ANON_KEY" });

    unsafe { clear_env() };
}

#[test]
fn from_env_bad_port_errors() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        set_required();
        std::env::set_var("PORT", "eighty");
    }

    let err = AppConfig::from_env().unwrap_err();
    assert_eq!(err, ConfigError::Invalid { var: "PORT", value: "eighty".into() });
    assert!(err.to_string().contains("PORT"));

    unsafe { clear_env() };
}

#[test]
fn from_env_bad_bind_addr_errors() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        set_required();
        std::env::set_var("BIND_ADDR", "localhost:80");
    }

    assert_eq!(
        AppConfig::from_env().unwrap_err(),
        ConfigError::Invalid { var: "BIND_ADDR", value: "localhost:80".into() }
    );

    unsafe { clear_env() };
}

#[test]
fn trim_base_url_strips_trailing_slashes() {
    assert_eq!(trim_base_url("https://a.test//"), "https://a.test");
    assert_eq!(trim_base_url("https://a.test"), "https://a.test");
}
