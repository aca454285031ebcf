//! Delivery gate evaluation
//!
//! Inspects the install work orders tied to an opportunity and determines
//! whether delivery is complete: all install orders "Completed", every
//! mandatory evidence requirement satisfied with approved items, no failed
//! QA result, and at least one QA result recorded overall.

use std::sync::Arc;

use fieldline_domain::{EvidenceStatus, QaOutcome, Result};

use super::ports::{InstallWorkOrder, ProcessSnapshotRepository};

pub(crate) const BLOCKER_NO_INSTALL_ORDERS: &str = "No install work orders found.";
pub(crate) const BLOCKER_QA_NOT_COMPLETED: &str = "QA results are not completed.";
pub(crate) const BLOCKER_INVOICE_MISSING: &str = "Invoice reference is missing.";

/// Readiness check over an opportunity's install work orders.
///
/// Evaluation is read-only and returns blockers in discovery order;
/// duplicates are not suppressed at this layer (callers may dedupe).
pub struct DeliveryGate {
    repository: Arc<dyn ProcessSnapshotRepository>,
}

impl DeliveryGate {
    /// Create a gate over the given snapshot repository.
    pub fn new(repository: Arc<dyn ProcessSnapshotRepository>) -> Self {
        Self { repository }
    }

    /// Evaluate delivery readiness: work order completion, evidence and QA.
    ///
    /// An empty list means every gate passes.
    pub async fn evaluate_delivery(&self, opportunity_id: i64) -> Result<Vec<String>> {
        self.evaluate(opportunity_id, false).await
    }

    /// Evaluate delivery readiness plus the external invoice reference.
    pub async fn evaluate_invoiced(&self, opportunity_id: i64) -> Result<Vec<String>> {
        self.evaluate(opportunity_id, true).await
    }

    async fn evaluate(&self, opportunity_id: i64, require_invoice: bool) -> Result<Vec<String>> {
        let mut blockers = Vec::new();

        let install_orders = self.repository.find_install_orders(opportunity_id).await?;
        if install_orders.is_empty() {
            blockers.push(BLOCKER_NO_INSTALL_ORDERS.to_string());
        }

        for order in &install_orders {
            self.check_order(order, &mut blockers).await?;
        }

        // Global check: at least one QA result somewhere, not per order.
        let any_qa = install_orders.iter().any(|order| !order.qa_results.is_empty());
        if !any_qa {
            blockers.push(BLOCKER_QA_NOT_COMPLETED.to_string());
        }

        if require_invoice {
            let invoice = self.repository.find_invoice_link(opportunity_id).await?;
            if !invoice.is_some_and(|link| link.has_invoice_number()) {
                blockers.push(BLOCKER_INVOICE_MISSING.to_string());
            }
        }

        Ok(blockers)
    }

    async fn check_order(
        &self,
        order: &InstallWorkOrder,
        blockers: &mut Vec<String>,
    ) -> Result<()> {
        let wo = &order.work_order;
        if !wo.is_completed() {
            blockers.push(format!("Work order {} is not completed.", wo.id));
        }

        let requirements = self.repository.find_mandatory_requirements(wo.kind).await?;
        for requirement in &requirements {
            let approved = order
                .evidence_items
                .iter()
                .filter(|item| {
                    item.requirement_id == Some(requirement.id)
                        && item.status == EvidenceStatus::Approved
                })
                .count() as i64;
            if approved < requirement.required_count {
                blockers.push(format!(
                    "Work order {} missing approved evidence for requirement \"{}\".",
                    wo.id, requirement.name
                ));
            }
        }

        let failed_qa = order.qa_results.iter().any(|result| result.outcome == QaOutcome::Fail);
        if failed_qa {
            blockers.push(format!("Work order {} has failed QA results.", wo.id));
        }

        Ok(())
    }
}
