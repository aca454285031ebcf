//! Evidence service - core business logic

use std::sync::Arc;

use chrono::Utc;
use fieldline_domain::{
    constants, EvidenceItem, EvidenceRequirement, EvidenceStatus, FieldlineError, Result,
};
use tracing::info;

use super::ports::{EvidenceRepository, EvidenceReview, NewEvidenceItem, NewEvidenceRequirement};
use crate::opportunities::ports::OpportunityRepository;
use crate::workorders::ports::WorkOrderRepository;

/// Evidence service enforcing the approval guard and keeping the work
/// order's evidence gate summary current.
pub struct EvidenceService {
    repository: Arc<dyn EvidenceRepository>,
    work_orders: Arc<dyn WorkOrderRepository>,
    opportunities: Arc<dyn OpportunityRepository>,
}

impl EvidenceService {
    /// Create a new evidence service.
    pub fn new(
        repository: Arc<dyn EvidenceRepository>,
        work_orders: Arc<dyn WorkOrderRepository>,
        opportunities: Arc<dyn OpportunityRepository>,
    ) -> Self {
        Self { repository, work_orders, opportunities }
    }

    /// Create an evidence requirement template.
    pub async fn create_requirement(
        &self,
        requirement: NewEvidenceRequirement,
    ) -> Result<EvidenceRequirement> {
        if requirement.required_count < 1 {
            return Err(FieldlineError::InvalidInput("required count must be positive".into()));
        }
        self.repository.insert_requirement(requirement).await
    }

    /// Generate pending evidence items for a work order from the
    /// applicable requirement templates.
    ///
    /// One item is created per required capture, named after the
    /// requirement. The work order's evidence gate summary becomes Pending
    /// when anything was generated, Not Required otherwise.
    pub async fn generate_items(&self, work_order_id: i64) -> Result<Vec<EvidenceItem>> {
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

        let requirements = self
            .repository
            .find_applicable_requirements(
                work_order.kind,
                opportunity.product_offering_id,
                work_order.funding_type_id,
            )
            .await?;

        let mut created = Vec::new();
        for requirement in &requirements {
            for index in 0..requirement.required_count {
                let item = self
                    .repository
                    .insert_item(NewEvidenceItem {
                        name: format!("{} #{}", requirement.name, index + 1),
                        opportunity_id: work_order.opportunity_id,
                        work_order_id,
                        property_id: Some(work_order.property_id),
                        requirement_id: Some(requirement.id),
                        evidence_type_id: requirement.evidence_category_id,
                    })
                    .await?;
                created.push(item);
            }
        }

        let gate_status = if created.is_empty() {
            constants::GATE_STATUS_NOT_REQUIRED
        } else {
            constants::GATE_STATUS_PENDING
        };
        self.repository.set_evidence_gate_status(work_order_id, gate_status).await?;

        info!(work_order_id, generated = created.len(), "evidence items generated");
        Ok(created)
    }

    /// Attach a captured file to an evidence item, moving it to Submitted.
    pub async fn attach_file(&self, item_id: i64, file_path: String) -> Result<EvidenceItem> {
        if file_path.is_empty() {
            return Err(FieldlineError::InvalidInput("file path must not be empty".into()));
        }
        if self.repository.find_item(item_id).await?.is_none() {
            return Err(FieldlineError::NotFound("Evidence item not found".into()));
        }
        self.repository.attach_file(item_id, file_path, Utc::now()).await
    }

    /// Apply a review decision to an evidence item.
    ///
    /// Approval requires a file reference to already be attached. After
    /// the write, the owning work order's evidence gate summary is
    /// recomputed: Complete once no item is Pending, Submitted or
    /// Rejected.
    pub async fn review_item(&self, item_id: i64, review: EvidenceReview) -> Result<EvidenceItem> {
        let current = self
            .repository
            .find_item(item_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Evidence item not found".into()))?;

        if review.status == EvidenceStatus::Approved && !current.has_file() {
            let message = "Upload an image before approving evidence.";
            return Err(FieldlineError::blocked(message, vec![message.to_string()]));
        }

        let updated = self.repository.update_item_review(item_id, review, Utc::now()).await?;

        let items = self.repository.list_for_work_order(updated.work_order_id).await?;
        let outstanding = items.iter().any(EvidenceItem::is_outstanding);
        let gate_status = if outstanding {
            constants::GATE_STATUS_PENDING
        } else {
            constants::GATE_STATUS_COMPLETE
        };
        self.repository.set_evidence_gate_status(updated.work_order_id, gate_status).await?;

        Ok(updated)
    }

    /// All evidence items for a work order, oldest first.
    pub async fn items_for_work_order(&self, work_order_id: i64) -> Result<Vec<EvidenceItem>> {
        self.repository.list_for_work_order(work_order_id).await
    }
}
