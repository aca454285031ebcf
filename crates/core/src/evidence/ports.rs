//! Port interfaces for evidence persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_domain::{
    EvidenceItem, EvidenceRequirement, EvidenceStatus, Result, WorkOrderKind,
};

/// Fields for creating an evidence requirement template.
#[derive(Debug, Clone)]
pub struct NewEvidenceRequirement {
    pub name: String,
    pub product_offering_id: Option<i64>,
    pub work_order_kind: Option<WorkOrderKind>,
    pub funding_type_id: Option<i64>,
    pub evidence_category_id: Option<i64>,
    pub required_count: i64,
    pub mandatory: bool,
    pub sort_order: i64,
}

/// Fields for creating an evidence item.
#[derive(Debug, Clone)]
pub struct NewEvidenceItem {
    pub name: String,
    pub opportunity_id: i64,
    pub work_order_id: i64,
    pub property_id: Option<i64>,
    pub requirement_id: Option<i64>,
    pub evidence_type_id: Option<i64>,
}

/// Review decision on an evidence item.
#[derive(Debug, Clone)]
pub struct EvidenceReview {
    pub status: EvidenceStatus,
    pub reviewer: Option<String>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
}

/// Trait for persisting evidence requirements and items.
#[async_trait]
pub trait EvidenceRepository: Send + Sync {
    /// Insert a requirement template.
    async fn insert_requirement(
        &self,
        requirement: NewEvidenceRequirement,
    ) -> Result<EvidenceRequirement>;

    /// Active requirements applicable to the given scoping values; each
    /// dimension matches when the requirement leaves it unset or the
    /// values are equal. Ordered by sort order, then id.
    async fn find_applicable_requirements(
        &self,
        kind: WorkOrderKind,
        product_offering_id: Option<i64>,
        funding_type_id: Option<i64>,
    ) -> Result<Vec<EvidenceRequirement>>;

    /// Insert an evidence item.
    async fn insert_item(&self, item: NewEvidenceItem) -> Result<EvidenceItem>;

    /// Fetch an evidence item.
    async fn find_item(&self, item_id: i64) -> Result<Option<EvidenceItem>>;

    /// Attach a captured file: sets the path, capture time and moves the
    /// item to Submitted.
    async fn attach_file(
        &self,
        item_id: i64,
        file_path: String,
        captured_at: DateTime<Utc>,
    ) -> Result<EvidenceItem>;

    /// Apply a review decision.
    async fn update_item_review(
        &self,
        item_id: i64,
        review: EvidenceReview,
        reviewed_at: DateTime<Utc>,
    ) -> Result<EvidenceItem>;

    /// All evidence items for a work order, oldest first.
    async fn list_for_work_order(&self, work_order_id: i64) -> Result<Vec<EvidenceItem>>;

    /// Persist the derived evidence gate summary on the work order.
    async fn set_evidence_gate_status(&self, work_order_id: i64, status: &str) -> Result<()>;
}
