//! Auth services consumed by the HTTP surfaces and the presentation layer.
//!
//! ARCHITECTURE
//! ============
//! Data flows one way: identity service → `session` (push, via
//! subscription) → `role` (pull, per session generation) → `gate` (pull, on
//! render). `network_login` is an independent fallback identity and `admin`
//! composes `session` and `role` for the back-office login.

pub mod admin;
pub mod gate;
pub mod network_login;
pub mod role;
pub mod session;
