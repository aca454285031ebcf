//! Quality assurance types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;
use crate::types::work_order::WorkOrderKind;

/// Outcome of one checklist item on one work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QaOutcome {
    Pass,
    Fail,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Default for QaOutcome {
    fn default() -> Self {
        Self::NotApplicable
    }
}

impl_status_conversions!(QaOutcome {
    Pass => "Pass",
    Fail => "Fail",
    NotApplicable => "N/A",
});

/// Checklist template, scoped by product offering and work order kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaChecklist {
    pub id: i64,
    pub name: String,
    pub product_offering_id: Option<i64>,
    pub work_order_kind: Option<WorkOrderKind>,
    pub is_active: bool,
    pub items: Vec<QaChecklistItem>,
}

/// One check on a checklist template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaChecklistItem {
    pub id: i64,
    pub checklist_id: i64,
    pub item_text: String,
    pub mandatory: bool,
    pub sort_order: i64,
}

/// Recorded outcome of a checklist item for a specific work order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaResult {
    pub id: i64,
    pub opportunity_id: i64,
    pub work_order_id: i64,
    pub checklist_item_id: i64,
    pub outcome: QaOutcome,
    pub notes: Option<String>,
    pub checked_by: Option<String>,
    pub checked_on: Option<DateTime<Utc>>,
}
