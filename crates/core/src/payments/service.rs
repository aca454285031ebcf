//! Payment service - core business logic

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fieldline_domain::{FieldlineError, PaymentRequest, PaymentStatus, Result};
use tracing::info;

use super::ports::{NewPaymentRequest, PaymentRepository};
use crate::opportunities::ports::OpportunityRepository;
use crate::process::ProcessEngine;

/// Payment service enforcing the payment-request guard.
pub struct PaymentService {
    repository: Arc<dyn PaymentRepository>,
    opportunities: Arc<dyn OpportunityRepository>,
    engine: Arc<ProcessEngine>,
}

impl PaymentService {
    /// Create a new payment service.
    pub fn new(
        repository: Arc<dyn PaymentRepository>,
        opportunities: Arc<dyn OpportunityRepository>,
        engine: Arc<ProcessEngine>,
    ) -> Self {
        Self { repository, opportunities, engine }
    }

    /// Request payment for an opportunity.
    ///
    /// Two checks must both pass: the process status capability and an
    /// independent delivery-gate pass taken immediately before the write.
    pub async fn request_payment(
        &self,
        opportunity_id: i64,
        request: NewPaymentRequest,
    ) -> Result<PaymentRequest> {
        if request.amount_requested <= 0.0 {
            return Err(FieldlineError::InvalidInput("amount must be positive".into()));
        }

        let opportunity = self
            .opportunities
            .find_opportunity(opportunity_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))?;

        let process = self.engine.process_status(opportunity_id).await?;
        if !process.can_request_payment {
            return Err(FieldlineError::blocked(
                "Payment request blocked by process rules.",
                process.blocked_reasons,
            ));
        }

        let blockers = self.engine.gate().evaluate_delivery(opportunity_id).await?;
        if !blockers.is_empty() {
            return Err(FieldlineError::blocked(
                "Payment request blocked by delivery/evidence/QA gates.",
                blockers,
            ));
        }

        let created = self
            .repository
            .insert_request(
                opportunity_id,
                Some(opportunity.property_id),
                request,
                Utc::now(),
                process.revision,
            )
            .await?;
        info!(opportunity_id, request_id = created.id, "payment requested");
        Ok(created)
    }

    /// Record external settlement progress on a request.
    pub async fn update_status(
        &self,
        request_id: i64,
        status: PaymentStatus,
        paid_on: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<PaymentRequest> {
        if self.repository.find_request(request_id).await?.is_none() {
            return Err(FieldlineError::NotFound("Payment request not found".into()));
        }
        self.repository.update_status(request_id, status, paid_on, notes).await
    }

    /// All payment requests for an opportunity, newest first.
    pub async fn requests_for_opportunity(
        &self,
        opportunity_id: i64,
    ) -> Result<Vec<PaymentRequest>> {
        self.repository.list_for_opportunity(opportunity_id).await
    }
}
