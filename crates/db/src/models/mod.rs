//! Row models and input DTOs, one module per table group.

pub mod cv;
pub mod dashboard;
pub mod job;
pub mod notification;
pub mod offer;
pub mod payment;
pub mod process;
pub mod role;
pub mod session;
pub mod transfer;
pub mod user;
