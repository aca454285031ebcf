//! Port interfaces for work order persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_domain::{Result, WorkOrder, WorkOrderKind};

/// Fields for creating a work order.
#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub opportunity_id: i64,
    pub kind: WorkOrderKind,
    pub evidence_required: bool,
}

/// Scheduling window for a work order.
#[derive(Debug, Clone)]
pub struct WorkOrderSchedule {
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
}

/// Progress update for a work order; `status` is free-form.
#[derive(Debug, Clone)]
pub struct WorkOrderStatusUpdate {
    pub status: String,
    pub substatus: Option<String>,
    pub completion_blocked_reason: Option<String>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
}

/// Trait for persisting work orders.
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    /// Insert a work order after a passed guard, bumping the opportunity
    /// revision; a revision mismatch surfaces as a conflict.
    async fn insert_work_order(
        &self,
        order: NewWorkOrder,
        property_id: i64,
        funding_type_id: Option<i64>,
        expected_revision: i64,
    ) -> Result<WorkOrder>;

    /// Fetch a work order.
    async fn find_work_order(&self, work_order_id: i64) -> Result<Option<WorkOrder>>;

    /// Set the scheduled window.
    async fn schedule(&self, work_order_id: i64, schedule: WorkOrderSchedule) -> Result<WorkOrder>;

    /// Apply a progress update.
    async fn update_status(
        &self,
        work_order_id: i64,
        update: WorkOrderStatusUpdate,
    ) -> Result<WorkOrder>;

    /// All work orders for an opportunity.
    async fn list_for_opportunity(&self, opportunity_id: i64) -> Result<Vec<WorkOrder>>;
}
