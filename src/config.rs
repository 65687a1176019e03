//! Application configuration parsed from environment variables.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

pub const DEFAULT_PI_API_URL: &str = "https://api.minepi.com";
pub const DEFAULT_LOGIN_PATH: &str = "/auth";
pub const DEFAULT_ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const DEFAULT_ADMIN_LANDING_PATH: &str = "/admin";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PORT: u16 = 3000;
/// Loopback: the HTTP surfaces act for a single operator's session.
pub const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Connection settings for the hosted identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub base_url: String,
    pub anon_key: String,
    pub timeout: Duration,
}

/// Connection settings for the payment network login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub base_url: String,
    pub access_token: String,
    pub timeout: Duration,
}

/// Where gated surfaces send the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationConfig {
    pub login_path: String,
    pub admin_login_path: String,
    pub admin_landing_path: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.into(),
            admin_login_path: DEFAULT_ADMIN_LOGIN_PATH.into(),
            admin_landing_path: DEFAULT_ADMIN_LANDING_PATH.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    /// `None` when `PI_ACCESS_TOKEN` is unset; network login is then unavailable.
    pub network: Option<NetworkConfig>,
    pub navigation: NavigationConfig,
    /// Persisted refresh token used to restore a session at startup.
    pub refresh_token: Option<String>,
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `IDENTITY_URL`
    /// - `IDENTITY_ANON_KEY`
    ///
    /// Optional:
    /// - `IDENTITY_REFRESH_TOKEN`
    /// - `PI_API_URL`: default `https://api.minepi.com`
    /// - `PI_ACCESS_TOKEN`: enables the network login
    /// - `LOGIN_PATH`, `ADMIN_LOGIN_PATH`, `ADMIN_LANDING_PATH`
    /// - `HTTP_TIMEOUT_SECS`: default 10
    /// - `BIND_ADDR`: default `127.0.0.1`
    /// - `PORT`: default 3000
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a numeric one
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout = Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?);

        let identity = IdentityConfig {
            base_url: trim_base_url(&required("IDENTITY_URL")?),
            anon_key: required("IDENTITY_ANON_KEY")?,
            timeout,
        };

        let network = optional("PI_ACCESS_TOKEN").map(|access_token| NetworkConfig {
            base_url: trim_base_url(&optional("PI_API_URL").unwrap_or_else(|| DEFAULT_PI_API_URL.into())),
            access_token,
            timeout,
        });

        let navigation = NavigationConfig {
            login_path: optional("LOGIN_PATH").unwrap_or_else(|| DEFAULT_LOGIN_PATH.into()),
            admin_login_path: optional("ADMIN_LOGIN_PATH").unwrap_or_else(|| DEFAULT_ADMIN_LOGIN_PATH.into()),
            admin_landing_path: optional("ADMIN_LANDING_PATH").unwrap_or_else(|| DEFAULT_ADMIN_LANDING_PATH.into()),
        };

        Ok(Self {
            identity,
            network,
            navigation,
            refresh_token: optional("IDENTITY_REFRESH_TOKEN"),
            bind_addr: env_parse("BIND_ADDR", DEFAULT_BIND_ADDR)?,
            port: env_parse("PORT", DEFAULT_PORT)?,
        })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::Missing { var })
}

/// Unset and blank values are both treated as absent.
fn optional(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { var, value }),
    }
}

fn trim_base_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_owned()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
