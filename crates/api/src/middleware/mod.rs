//! Authentication and role extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`rbac::RequireWorkerManager`] -- agents, recruitment companies and admins.
//!
//! Row-level decisions go through `placement_core::access`; these extractors
//! only gate whole endpoints.

pub mod auth;
pub mod rbac;
