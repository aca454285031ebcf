//! Process status computation - core business logic
//!
//! The orchestrator over the stage ladder and the delivery gate. Status is
//! recomputed on every read; it is never cached or persisted, since any of
//! several independently mutated child tables can invalidate it.

use std::sync::Arc;

use fieldline_domain::{
    AssessmentPathKind, FieldlineError, ProcessStatus, QuoteStatus, Result, WorkOrderKind,
};
use tracing::debug;

use super::gates::DeliveryGate;
use super::ports::{OpportunitySnapshot, ProcessSnapshotRepository};

pub(crate) const BLOCKER_NO_ASSESSMENT_PATH: &str = "Assessment path is not selected.";
pub(crate) const BLOCKER_DESKTOP_APPROVAL: &str =
    "Desktop assessment requires approval before progressing.";
pub(crate) const BLOCKER_SURVEY_REQUIRED: &str =
    "Site survey is required before quote/install progression.";

pub(crate) const ACTION_CREATE_SURVEY_WORK_ORDER: &str = "Create Survey Work Order";
pub(crate) const ACTION_CREATE_OR_ACCEPT_QUOTE: &str = "Create or Accept Quote";
pub(crate) const ACTION_CREATE_INSTALL_WORK_ORDER: &str = "Create Install Work Order";
pub(crate) const ACTION_PROGRESS_INSTALL_WORK_ORDERS: &str = "Progress Install Work Orders";
pub(crate) const ACTION_REQUEST_PAYMENT: &str = "Request Payment";
pub(crate) const ACTION_CLOSE_OPPORTUNITY: &str = "Close Opportunity";

/// Process engine for computing opportunity capabilities
pub struct ProcessEngine {
    repository: Arc<dyn ProcessSnapshotRepository>,
    gate: DeliveryGate,
}

impl ProcessEngine {
    /// Create a new process engine over the snapshot repository.
    pub fn new(repository: Arc<dyn ProcessSnapshotRepository>) -> Self {
        let gate = DeliveryGate::new(Arc::clone(&repository));
        Self { repository, gate }
    }

    /// Borrow the delivery gate for direct evaluation.
    pub fn gate(&self) -> &DeliveryGate {
        &self.gate
    }

    /// Compute the current process status for an opportunity.
    ///
    /// # Errors
    /// Returns [`FieldlineError::NotFound`] when the opportunity does not
    /// exist; otherwise only infrastructure failures surface.
    pub async fn process_status(&self, opportunity_id: i64) -> Result<ProcessStatus> {
        let snapshot = self
            .repository
            .load_snapshot(opportunity_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))?;

        let close_blockers = self.gate.evaluate_delivery(opportunity_id).await?;
        Ok(compute_status(&snapshot, close_blockers))
    }
}

fn compute_status(snapshot: &OpportunitySnapshot, close_blockers: Vec<String>) -> ProcessStatus {
    let opportunity = &snapshot.opportunity;

    let has_accepted_quote =
        snapshot.quotes.iter().any(|q| q.quote.status == QuoteStatus::Accepted);
    let survey_order_count =
        snapshot.work_orders.iter().filter(|wo| wo.kind == WorkOrderKind::Survey).count();
    let install_order_count =
        snapshot.work_orders.iter().filter(|wo| wo.kind == WorkOrderKind::Install).count();
    let has_completed_survey = snapshot
        .work_orders
        .iter()
        .any(|wo| wo.kind == WorkOrderKind::Survey && wo.is_completed());

    let requires_survey = opportunity.requires_survey;
    let assessment_path = snapshot.assessment_path.as_ref().map(|path| path.kind);

    let mut blockers = Vec::new();
    let mut next_actions = Vec::new();

    match assessment_path {
        None => blockers.push(BLOCKER_NO_ASSESSMENT_PATH.to_string()),
        Some(kind) => {
            if kind == AssessmentPathKind::Desktop {
                // Permanent manual gate; approval happens out of band.
                blockers.push(BLOCKER_DESKTOP_APPROVAL.to_string());
            }
            if kind == AssessmentPathKind::SiteSurvey && !has_completed_survey {
                blockers.push(BLOCKER_SURVEY_REQUIRED.to_string());
                if survey_order_count == 0 {
                    next_actions.push(ACTION_CREATE_SURVEY_WORK_ORDER.to_string());
                }
            }
        }
    }

    if has_accepted_quote {
        next_actions.push(ACTION_CREATE_INSTALL_WORK_ORDER.to_string());
    } else {
        next_actions.push(ACTION_CREATE_OR_ACCEPT_QUOTE.to_string());
    }

    if has_accepted_quote && install_order_count > 0 {
        next_actions.push(ACTION_PROGRESS_INSTALL_WORK_ORDERS.to_string());
    }

    let can_request_payment = close_blockers.is_empty();
    let can_close = close_blockers.is_empty();
    let can_create_quote = !requires_survey || has_completed_survey;
    let can_create_survey_work_order = requires_survey && !has_completed_survey;
    let can_create_install_work_order =
        has_accepted_quote && (!requires_survey || has_completed_survey);

    if can_request_payment {
        next_actions.push(ACTION_REQUEST_PAYMENT.to_string());
    }
    if can_close {
        next_actions.push(ACTION_CLOSE_OPPORTUNITY.to_string());
    }

    blockers.extend(close_blockers);

    debug!(
        opportunity_id = opportunity.id,
        blockers = blockers.len(),
        can_create_quote,
        can_close,
        "process status computed"
    );

    ProcessStatus {
        opportunity_id: opportunity.id,
        current_stage: opportunity.sales_stage,
        assessment_path,
        requires_survey,
        has_accepted_quote,
        has_completed_survey,
        can_create_quote,
        can_create_survey_work_order,
        can_create_install_work_order,
        can_request_payment,
        can_close,
        blocked_reasons: dedup_preserving_order(blockers),
        next_actions: dedup_preserving_order(next_actions),
        revision: opportunity.revision,
    }
}

/// Remove duplicates while keeping first-seen order.
fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}
