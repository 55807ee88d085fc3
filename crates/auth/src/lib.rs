//! `cardboard-auth`: identity and ownership authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: the caller
//! authenticates, this crate decides whether the principal may touch a
//! resource owned by some user.

pub mod authorize;
pub mod principal;
pub mod user;

pub use authorize::{Access, Authorizer, AuthzError, OwnerPolicy, authorize};
pub use principal::Principal;
pub use user::User;
