//! Dashboard aggregate models.

use serde::Serialize;
use sqlx::FromRow;

/// Number of CVs in one status.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Counters shown on the caller's dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub cvs_by_status: Vec<StatusCount>,
    pub total_cvs: i64,
    pub pending_offers_made: i64,
    pub pending_offers_received: i64,
    pub pending_transfers_received: i64,
    pub active_processes: i64,
    pub unread_notifications: i64,
}
