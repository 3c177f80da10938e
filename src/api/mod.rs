//! Typed access to the wallet backend.
//!
//! [`AdminApi`] covers the admin dashboard endpoints and goes through the
//! query cache. [`AuthClient`] handles login, which is never cached.
//! [`actions`] wraps the admin writes as user-facing actions that always
//! resolve to a [`Notice`](crate::notify::Notice).

pub mod actions;
mod admin;
mod auth;

pub use admin::AdminApi;
pub use auth::{AuthClient, LoginOutcome};
