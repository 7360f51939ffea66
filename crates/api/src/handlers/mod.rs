//! Request handlers, one submodule per resource.
//!
//! Handlers authorize through `placement_core::access`, delegate persistence
//! to the repositories in `placement_db` and map errors via [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

pub mod admin;
pub mod auth;
pub mod cvs;
pub mod dashboard;
pub mod jobs;
pub mod notifications;
pub mod offers;
pub mod payments;
pub mod transfers;
