//! Opportunity service - core business logic

use std::sync::Arc;

use chrono::Utc;
use fieldline_domain::{
    FieldlineError, Opportunity, ProcessStatus, Result, TimelineNote, XeroInvoiceLink,
};
use tracing::info;

use super::ports::{InvoiceLinkUpdate, OpportunityPatch, OpportunityRepository};
use crate::process::stages::stage_transition_allowed;
use crate::process::ProcessEngine;

/// Opportunity service enforcing the stage ladder and close guards.
pub struct OpportunityService {
    repository: Arc<dyn OpportunityRepository>,
    engine: Arc<ProcessEngine>,
}

impl OpportunityService {
    /// Create a new opportunity service.
    pub fn new(repository: Arc<dyn OpportunityRepository>, engine: Arc<ProcessEngine>) -> Self {
        Self { repository, engine }
    }

    /// Fetch an opportunity.
    pub async fn opportunity(&self, opportunity_id: i64) -> Result<Opportunity> {
        self.repository
            .find_opportunity(opportunity_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))
    }

    /// Compute the current process status.
    pub async fn process_status(&self, opportunity_id: i64) -> Result<ProcessStatus> {
        self.engine.process_status(opportunity_id).await
    }

    /// Apply a patch-style update.
    ///
    /// A requested sales stage move is checked against the stage ladder;
    /// backward moves and unrecognized stage names are refused.
    pub async fn update_opportunity(
        &self,
        opportunity_id: i64,
        patch: OpportunityPatch,
    ) -> Result<Opportunity> {
        let existing = self.opportunity(opportunity_id).await?;

        if let Some(requested) = patch.sales_stage.as_deref() {
            let current = existing.sales_stage.to_string();
            if !stage_transition_allowed(&current, Some(requested)) {
                return Err(FieldlineError::blocked(
                    "Invalid stage transition.",
                    vec![format!("Cannot move stage from \"{current}\" to \"{requested}\".")],
                ));
            }
        }

        self.repository.update_opportunity(opportunity_id, patch).await
    }

    /// Close the opportunity once every delivery gate passes.
    ///
    /// Prefers the blockers already computed by the process status; when
    /// that list is empty the delivery gate is re-run as a final check
    /// before the irreversible write.
    pub async fn close_opportunity(&self, opportunity_id: i64) -> Result<Opportunity> {
        let process = self.engine.process_status(opportunity_id).await?;
        let blockers = if process.blocked_reasons.is_empty() {
            self.engine.gate().evaluate_delivery(opportunity_id).await?
        } else {
            process.blocked_reasons
        };

        if !blockers.is_empty() {
            return Err(FieldlineError::blocked("Opportunity close blocked", blockers));
        }

        let closed =
            self.repository.close_opportunity(opportunity_id, Utc::now(), process.revision).await?;
        info!(opportunity_id, "opportunity closed");
        Ok(closed)
    }

    /// Upsert the external invoice mirror for an opportunity.
    pub async fn link_invoice(
        &self,
        opportunity_id: i64,
        update: InvoiceLinkUpdate,
    ) -> Result<XeroInvoiceLink> {
        self.opportunity(opportunity_id).await?;
        self.repository.upsert_invoice_link(opportunity_id, update, Utc::now()).await
    }

    /// Append a timeline note.
    pub async fn add_timeline_note(
        &self,
        opportunity_id: i64,
        note: String,
        created_by: Option<String>,
    ) -> Result<TimelineNote> {
        if note.is_empty() {
            return Err(FieldlineError::InvalidInput("note must not be empty".into()));
        }
        self.repository.add_timeline_note(opportunity_id, note, created_by).await
    }

    /// Timeline notes for an opportunity, oldest first.
    pub async fn timeline(&self, opportunity_id: i64) -> Result<Vec<TimelineNote>> {
        self.repository.list_timeline(opportunity_id).await
    }
}
