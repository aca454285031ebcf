//! Evidence capture types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;
use crate::types::work_order::WorkOrderKind;

/// Review state of a single evidence item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceStatus {
    Pending,
    Submitted,
    Approved,
    Rejected,
}

impl Default for EvidenceStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl_status_conversions!(EvidenceStatus {
    Pending => "Pending",
    Submitted => "Submitted",
    Approved => "Approved",
    Rejected => "Rejected",
});

/// Template row scoping how much evidence a work order must carry.
///
/// Each scoping dimension is optional; `None` means the requirement
/// applies to all values of that dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRequirement {
    pub id: i64,
    pub name: String,
    pub product_offering_id: Option<i64>,
    pub work_order_kind: Option<WorkOrderKind>,
    pub funding_type_id: Option<i64>,
    pub evidence_category_id: Option<i64>,
    pub required_count: i64,
    pub mandatory: bool,
    pub sort_order: i64,
    pub is_active: bool,
}

/// A single captured piece of evidence against a work order.
///
/// Approval requires a file reference to already be attached; the guard
/// lives at the mutation boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: i64,
    pub name: String,
    pub opportunity_id: i64,
    pub work_order_id: i64,
    pub property_id: Option<i64>,
    pub requirement_id: Option<i64>,
    pub evidence_type_id: Option<i64>,
    pub status: EvidenceStatus,
    pub file_path: Option<String>,
    pub captured_on: Option<DateTime<Utc>>,
    pub reviewer: Option<String>,
    pub reviewed_on: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EvidenceItem {
    /// Whether a file reference has been captured for this item.
    pub fn has_file(&self) -> bool {
        self.file_path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Items still awaiting review keep the work order's evidence gate open.
    pub fn is_outstanding(&self) -> bool {
        matches!(
            self.status,
            EvidenceStatus::Pending | EvidenceStatus::Submitted | EvidenceStatus::Rejected
        )
    }
}
