//! QA service - core business logic

use std::sync::Arc;

use chrono::Utc;
use fieldline_domain::{constants, FieldlineError, QaChecklist, QaOutcome, QaResult, Result};
use tracing::info;

use super::ports::{NewQaChecklist, NewQaResult, QaRepository, QaResultUpdate};
use crate::opportunities::ports::OpportunityRepository;
use crate::workorders::ports::WorkOrderRepository;

/// QA service keeping the work order's QA gate summary current.
pub struct QaService {
    repository: Arc<dyn QaRepository>,
    work_orders: Arc<dyn WorkOrderRepository>,
    opportunities: Arc<dyn OpportunityRepository>,
}

impl QaService {
    /// Create a new QA service.
    pub fn new(
        repository: Arc<dyn QaRepository>,
        work_orders: Arc<dyn WorkOrderRepository>,
        opportunities: Arc<dyn OpportunityRepository>,
    ) -> Self {
        Self { repository, work_orders, opportunities }
    }

    /// Create a checklist template; at least one item is required.
    pub async fn create_checklist(&self, checklist: NewQaChecklist) -> Result<QaChecklist> {
        if checklist.items.is_empty() {
            return Err(FieldlineError::InvalidInput(
                "checklist must have at least one item".into(),
            ));
        }
        self.repository.insert_checklist(checklist).await
    }

    /// Seed result rows for a work order from the applicable checklist.
    ///
    /// One N/A result is created per checklist item; items that already
    /// have a result are left untouched, so regeneration is idempotent.
    /// The work order's QA gate summary becomes Pending when any results
    /// exist, Not Required otherwise.
    pub async fn generate_results(&self, work_order_id: i64) -> Result<Vec<QaResult>> {
        let work_order = self
            .work_orders
            .find_work_order(work_order_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Work order not found".into()))?;
        let opportunity = self
            .opportunities
            .find_opportunity(work_order.opportunity_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))?;

        let checklist = self
            .repository
            .find_applicable_checklist(work_order.kind, opportunity.product_offering_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("No QA checklist found".into()))?;

        let mut results = Vec::new();
        for item in &checklist.items {
            if let Some(existing) =
                self.repository.find_result_for_item(work_order_id, item.id).await?
            {
                results.push(existing);
                continue;
            }
            let created = self
                .repository
                .insert_result(NewQaResult {
                    opportunity_id: work_order.opportunity_id,
                    work_order_id,
                    checklist_item_id: item.id,
                })
                .await?;
            results.push(created);
        }

        let gate_status = if results.is_empty() {
            constants::GATE_STATUS_NOT_REQUIRED
        } else {
            constants::GATE_STATUS_PENDING
        };
        self.repository.set_qa_gate_status(work_order_id, gate_status).await?;

        info!(work_order_id, results = results.len(), "qa results generated");
        Ok(results)
    }

    /// Record an outcome on a result row.
    ///
    /// After the write, the owning work order's QA gate summary is
    /// recomputed: Complete once nothing remains N/A and nothing failed.
    pub async fn record_result(&self, result_id: i64, update: QaResultUpdate) -> Result<QaResult> {
        if self.repository.find_result(result_id).await?.is_none() {
            return Err(FieldlineError::NotFound("QA result not found".into()));
        }

        let updated = self.repository.update_result(result_id, update, Utc::now()).await?;

        let results = self.repository.list_for_work_order(updated.work_order_id).await?;
        let unanswered =
            results.iter().any(|result| result.outcome == QaOutcome::NotApplicable);
        let failed = results.iter().any(|result| result.outcome == QaOutcome::Fail);
        let gate_status = if !unanswered && !failed {
            constants::GATE_STATUS_COMPLETE
        } else {
            constants::GATE_STATUS_PENDING
        };
        self.repository.set_qa_gate_status(updated.work_order_id, gate_status).await?;

        Ok(updated)
    }

    /// All results for a work order.
    pub async fn results_for_work_order(&self, work_order_id: i64) -> Result<Vec<QaResult>> {
        self.repository.list_for_work_order(work_order_id).await
    }
}
