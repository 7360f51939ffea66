//! Domain types and business rules for the placement platform.
//!
//! Nothing in this crate touches the database or HTTP; the `db` and `api`
//! crates call into it for validation, lifecycle rules and authorization.

pub mod access;
pub mod cv;
pub mod error;
pub mod job;
pub mod mrz;
pub mod notification;
pub mod offer;
pub mod pagination;
pub mod payment;
pub mod process;
pub mod roles;
pub mod status;
pub mod transfer;
pub mod types;
