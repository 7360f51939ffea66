//! Repository layer: one zero-sized struct per table group.
//!
//! Each repository exposes async methods taking `&PgPool` (or an open
//! transaction for multi-row workflows). Entities implement
//! [`base::Entity`] so lookups, lists and authorization go through
//! [`base::BaseRepo`].

pub mod base;
pub mod cv_repo;
pub mod dashboard_repo;
pub mod job_repo;
pub mod notification_repo;
pub mod offer_repo;
pub mod payment_repo;
pub mod process_repo;
pub mod role_repo;
pub mod session_repo;
pub mod transfer_repo;
pub mod user_repo;

pub use base::{BaseRepo, Condition, Entity};
pub use cv_repo::CvRepo;
pub use dashboard_repo::DashboardRepo;
pub use job_repo::JobRepo;
pub use notification_repo::NotificationRepo;
pub use offer_repo::OfferRepo;
pub use payment_repo::PaymentRepo;
pub use process_repo::ProcessRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use transfer_repo::TransferRepo;
pub use user_repo::UserRepo;
