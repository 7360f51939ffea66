//! Placement process model.

use placement_core::process::ProcessSummary;
use placement_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `cv_processes` table, plus the owner of the CV.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CvProcess {
    pub id: DbId,
    pub cv_id: DbId,
    pub offer_id: DbId,
    pub employer_id: DbId,
    pub completed_steps: i16,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub cv_owner_id: DbId,
}

/// A row from the `process_step_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProcessStepLog {
    pub id: DbId,
    pub process_id: DbId,
    pub step: String,
    pub action: String,
    pub actor_id: DbId,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

/// Process state as returned by `GET /cvs/{id}/process`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessView {
    pub process: CvProcess,
    #[serde(flatten)]
    pub summary: ProcessSummary,
    pub history: Vec<ProcessStepLog>,
}
