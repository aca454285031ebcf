//! Work order types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;

/// Closed set of work order kinds, fixed by seed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkOrderKind {
    Survey,
    Install,
    Remedial,
}

impl_status_conversions!(WorkOrderKind {
    Survey => "Survey",
    Install => "Install",
    Remedial => "Remedial",
});

/// A schedulable unit of field work.
///
/// `status` is free-form but progresses at minimum through
/// Scheduled → In Progress → Completed. `evidence_gate_status` and
/// `qa_gate_status` are derived summaries recomputed whenever child
/// evidence/QA rows change; the process engine never reads them back,
/// it re-derives gate state from the child rows on every evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: i64,
    pub opportunity_id: i64,
    pub property_id: i64,
    pub kind: WorkOrderKind,
    pub funding_type_id: Option<i64>,
    pub status: String,
    pub substatus: Option<String>,
    pub completion_blocked_reason: Option<String>,
    pub evidence_required: bool,
    pub evidence_gate_status: String,
    pub qa_gate_status: String,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WorkOrder {
    /// Whether field delivery on this order has finished.
    pub fn is_completed(&self) -> bool {
        self.status == crate::constants::WORK_ORDER_STATUS_COMPLETED
    }
}
