//! Work order service - core business logic

use std::sync::Arc;

use fieldline_domain::{FieldlineError, Result, WorkOrder, WorkOrderKind};
use tracing::info;

use super::ports::{NewWorkOrder, WorkOrderRepository, WorkOrderSchedule, WorkOrderStatusUpdate};
use crate::opportunities::ports::OpportunityRepository;
use crate::process::ProcessEngine;

/// Work order service enforcing the per-kind creation guards.
pub struct WorkOrderService {
    repository: Arc<dyn WorkOrderRepository>,
    opportunities: Arc<dyn OpportunityRepository>,
    engine: Arc<ProcessEngine>,
}

impl WorkOrderService {
    /// Create a new work order service.
    pub fn new(
        repository: Arc<dyn WorkOrderRepository>,
        opportunities: Arc<dyn OpportunityRepository>,
        engine: Arc<ProcessEngine>,
    ) -> Self {
        Self { repository, opportunities, engine }
    }

    /// Create a work order against an opportunity.
    ///
    /// Survey and Install orders are guarded by the process rules;
    /// Remedial orders are not (they never feed gate evaluation).
    pub async fn create_work_order(&self, order: NewWorkOrder) -> Result<WorkOrder> {
        let opportunity = self
            .opportunities
            .find_opportunity(order.opportunity_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))?;

        let process = self.engine.process_status(order.opportunity_id).await?;
        match order.kind {
            WorkOrderKind::Survey if !process.can_create_survey_work_order => {
                return Err(FieldlineError::blocked(
                    "Survey work order creation blocked.",
                    process.blocked_reasons,
                ));
            }
            WorkOrderKind::Install if !process.can_create_install_work_order => {
                return Err(FieldlineError::blocked(
                    "Install work order creation blocked.",
                    process.blocked_reasons,
                ));
            }
            _ => {}
        }

        let created = self
            .repository
            .insert_work_order(
                order,
                opportunity.property_id,
                opportunity.funding_type_id,
                process.revision,
            )
            .await?;
        info!(
            work_order_id = created.id,
            opportunity_id = created.opportunity_id,
            kind = %created.kind,
            "work order created"
        );
        Ok(created)
    }

    /// Fetch a work order.
    pub async fn work_order(&self, work_order_id: i64) -> Result<WorkOrder> {
        self.repository
            .find_work_order(work_order_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Work order not found".into()))
    }

    /// Set the scheduled window on a work order.
    pub async fn schedule(
        &self,
        work_order_id: i64,
        schedule: WorkOrderSchedule,
    ) -> Result<WorkOrder> {
        self.work_order(work_order_id).await?;
        self.repository.schedule(work_order_id, schedule).await
    }

    /// Apply a progress update to a work order.
    pub async fn update_status(
        &self,
        work_order_id: i64,
        update: WorkOrderStatusUpdate,
    ) -> Result<WorkOrder> {
        if update.status.is_empty() {
            return Err(FieldlineError::InvalidInput("status must not be empty".into()));
        }
        self.work_order(work_order_id).await?;
        self.repository.update_status(work_order_id, update).await
    }

    /// All work orders for an opportunity.
    pub async fn work_orders_for_opportunity(&self, opportunity_id: i64) -> Result<Vec<WorkOrder>> {
        self.repository.list_for_opportunity(opportunity_id).await
    }
}
