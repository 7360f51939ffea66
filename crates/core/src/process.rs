//! The fixed placement pipeline every reserved worker walks through.
//!
//! A process row only stores how many steps are complete; everything else
//! (current step, per-step flags, percentage) is derived here.

use serde::Serialize;

use crate::error::CoreError;
use crate::status::CvStatus;

/// Administrative steps in the order they must be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStep {
    Contract,
    Medical,
    Visa,
    Fingerprint,
    WorkPermit,
    Ticket,
    Arrival,
}

pub const STEPS: [ProcessStep; 7] = [
    ProcessStep::Contract,
    ProcessStep::Medical,
    ProcessStep::Visa,
    ProcessStep::Fingerprint,
    ProcessStep::WorkPermit,
    ProcessStep::Ticket,
    ProcessStep::Arrival,
];

pub const TOTAL_STEPS: i16 = STEPS.len() as i16;

pub const LOG_ACTION_COMPLETED: &str = "completed";
pub const LOG_ACTION_REVERTED: &str = "reverted";

impl ProcessStep {
    pub fn name(self) -> &'static str {
        match self {
            ProcessStep::Contract => "contract",
            ProcessStep::Medical => "medical",
            ProcessStep::Visa => "visa",
            ProcessStep::Fingerprint => "fingerprint",
            ProcessStep::WorkPermit => "work_permit",
            ProcessStep::Ticket => "ticket",
            ProcessStep::Arrival => "arrival",
        }
    }

    /// Step at a zero-based position.
    pub fn at(index: i16) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| STEPS.get(i).copied())
    }
}

/// Integer percentage of completed steps, rounded down.
pub fn progress_percent(completed: i16) -> u8 {
    let completed = completed.clamp(0, TOTAL_STEPS) as u32;
    (completed * 100 / TOTAL_STEPS as u32) as u8
}

pub fn is_complete(completed: i16) -> bool {
    completed >= TOTAL_STEPS
}

/// Result of moving the pipeline one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepChange {
    pub step: ProcessStep,
    pub completed_after: i16,
    /// CV status to write, when the move changes it.
    pub cv_status: Option<CvStatus>,
}

/// Plan completing the next step.
pub fn plan_advance(completed: i16) -> Result<StepChange, CoreError> {
    let step = ProcessStep::at(completed)
        .ok_or_else(|| CoreError::Conflict("Process is already complete".into()))?;
    let completed_after = completed + 1;
    let cv_status = if completed == 0 {
        Some(CvStatus::InProcess)
    } else if is_complete(completed_after) {
        Some(CvStatus::Deployed)
    } else {
        None
    };
    Ok(StepChange {
        step,
        completed_after,
        cv_status,
    })
}

/// Plan undoing the most recently completed step.
pub fn plan_revert(completed: i16) -> Result<StepChange, CoreError> {
    if completed <= 0 {
        return Err(CoreError::Conflict(
            "Process has no completed steps to revert".into(),
        ));
    }
    let completed_after = completed - 1;
    let step = ProcessStep::at(completed_after).ok_or_else(|| {
        CoreError::Internal(format!("Process step index {completed_after} out of range"))
    })?;
    let cv_status = if completed_after == 0 {
        Some(CvStatus::Reserved)
    } else if is_complete(completed) {
        Some(CvStatus::InProcess)
    } else {
        None
    };
    Ok(StepChange {
        step,
        completed_after,
        cv_status,
    })
}

/// One row in the rendered step list.
#[derive(Debug, Clone, Serialize)]
pub struct StepState {
    pub step: ProcessStep,
    pub position: i16,
    pub done: bool,
}

/// Derived view of a process for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub completed_steps: i16,
    pub total_steps: i16,
    pub progress_percent: u8,
    pub current_step: Option<ProcessStep>,
    pub is_complete: bool,
    pub steps: Vec<StepState>,
}

pub fn summarize(completed: i16) -> ProcessSummary {
    let steps = STEPS
        .iter()
        .enumerate()
        .map(|(i, &step)| StepState {
            step,
            position: i as i16 + 1,
            done: (i as i16) < completed,
        })
        .collect();
    ProcessSummary {
        completed_steps: completed,
        total_steps: TOTAL_STEPS,
        progress_percent: progress_percent(completed),
        current_step: ProcessStep::at(completed),
        is_complete: is_complete(completed),
        steps,
    }
}
