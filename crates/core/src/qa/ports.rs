//! Port interfaces for QA persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_domain::{QaChecklist, QaOutcome, QaResult, Result, WorkOrderKind};

/// Fields for creating a checklist template.
#[derive(Debug, Clone)]
pub struct NewQaChecklist {
    pub name: String,
    pub product_offering_id: Option<i64>,
    pub work_order_kind: Option<WorkOrderKind>,
    pub items: Vec<NewQaChecklistItem>,
}

/// One check on a new checklist template.
#[derive(Debug, Clone)]
pub struct NewQaChecklistItem {
    pub item_text: String,
    pub mandatory: bool,
    pub sort_order: i64,
}

/// Fields for seeding a result row from a checklist item.
#[derive(Debug, Clone)]
pub struct NewQaResult {
    pub opportunity_id: i64,
    pub work_order_id: i64,
    pub checklist_item_id: i64,
}

/// Recorded outcome for an existing result row.
#[derive(Debug, Clone)]
pub struct QaResultUpdate {
    pub outcome: QaOutcome,
    pub notes: Option<String>,
    pub checked_by: Option<String>,
}

/// Trait for persisting QA checklists and results.
#[async_trait]
pub trait QaRepository: Send + Sync {
    /// Insert a checklist template with its items.
    async fn insert_checklist(&self, checklist: NewQaChecklist) -> Result<QaChecklist>;

    /// First active checklist applicable to the given scoping values; each
    /// dimension matches when the checklist leaves it unset or the values
    /// are equal. Items come back ordered by sort order.
    async fn find_applicable_checklist(
        &self,
        kind: WorkOrderKind,
        product_offering_id: Option<i64>,
    ) -> Result<Option<QaChecklist>>;

    /// Existing result for a checklist item on a work order, if any.
    async fn find_result_for_item(
        &self,
        work_order_id: i64,
        checklist_item_id: i64,
    ) -> Result<Option<QaResult>>;

    /// Seed a result row with outcome N/A.
    async fn insert_result(&self, result: NewQaResult) -> Result<QaResult>;

    /// Fetch a result row.
    async fn find_result(&self, result_id: i64) -> Result<Option<QaResult>>;

    /// Record an outcome on a result row.
    async fn update_result(
        &self,
        result_id: i64,
        update: QaResultUpdate,
        checked_at: DateTime<Utc>,
    ) -> Result<QaResult>;

    /// All results for a work order, in insertion order.
    async fn list_for_work_order(&self, work_order_id: i64) -> Result<Vec<QaResult>>;

    /// Persist the derived QA gate summary on the work order.
    async fn set_qa_gate_status(&self, work_order_id: i64, status: &str) -> Result<()>;
}
