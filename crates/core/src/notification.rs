//! Notification kinds and entity tags written alongside domain changes.

pub const KIND_OFFER_RECEIVED: &str = "offer_received";
pub const KIND_OFFER_ACCEPTED: &str = "offer_accepted";
pub const KIND_OFFER_REJECTED: &str = "offer_rejected";
pub const KIND_OFFER_CANCELLED: &str = "offer_cancelled";
pub const KIND_TRANSFER_REQUESTED: &str = "transfer_requested";
pub const KIND_TRANSFER_ACCEPTED: &str = "transfer_accepted";
pub const KIND_TRANSFER_REJECTED: &str = "transfer_rejected";
pub const KIND_TRANSFER_CANCELLED: &str = "transfer_cancelled";
pub const KIND_PROCESS_ADVANCED: &str = "process_advanced";
pub const KIND_PROCESS_REVERTED: &str = "process_reverted";
pub const KIND_PAYMENT_RECORDED: &str = "payment_recorded";
pub const KIND_PAYMENT_REVIEWED: &str = "payment_reviewed";

pub const ENTITY_OFFER: &str = "offer";
pub const ENTITY_TRANSFER: &str = "transfer";
pub const ENTITY_PROCESS: &str = "process";
pub const ENTITY_PAYMENT: &str = "payment";
