//! pifood-auth: authentication state core for the food-delivery front end.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store owns the one authoritative view of "who is signed in".
//! The role tracker derives, per session generation, whether that user may
//! enter admin surfaces. Auth gates combine both into a render, redirect or
//! loading decision. A secondary payment-network login supplies a fallback
//! identity for display when no primary session exists.

pub mod config;
pub mod display;
pub mod identity;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
