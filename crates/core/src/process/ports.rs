//! Port interfaces for process-status evaluation
//!
//! These traits define the boundary between the process engine and the
//! data-access layer. The engine only ever reads through this port; all
//! writes happen in the guarded services.

use async_trait::async_trait;
use fieldline_domain::{
    AssessmentPath, EvidenceItem, EvidenceRequirement, Opportunity, QaResult, Quote, QuoteLine,
    Result, WorkOrder, WorkOrderKind, XeroInvoiceLink,
};

/// A quote together with its ordered lines.
#[derive(Debug, Clone)]
pub struct QuoteWithLines {
    pub quote: Quote,
    pub lines: Vec<QuoteLine>,
}

/// An install work order with the child rows the delivery gate inspects.
#[derive(Debug, Clone)]
pub struct InstallWorkOrder {
    pub work_order: WorkOrder,
    pub evidence_items: Vec<EvidenceItem>,
    pub qa_results: Vec<QaResult>,
}

/// Read-only snapshot of everything the process engine needs to decide.
#[derive(Debug, Clone)]
pub struct OpportunitySnapshot {
    pub opportunity: Opportunity,
    pub assessment_path: Option<AssessmentPath>,
    pub quotes: Vec<QuoteWithLines>,
    pub work_orders: Vec<WorkOrder>,
}

/// Trait for loading opportunity-linked records for gate evaluation.
#[async_trait]
pub trait ProcessSnapshotRepository: Send + Sync {
    /// Load an opportunity with its assessment path, quotes (with lines)
    /// and work orders. Returns `None` when the opportunity does not exist.
    async fn load_snapshot(&self, opportunity_id: i64) -> Result<Option<OpportunitySnapshot>>;

    /// All install work orders for the opportunity, each with its evidence
    /// items and QA results.
    async fn find_install_orders(&self, opportunity_id: i64) -> Result<Vec<InstallWorkOrder>>;

    /// Active, mandatory evidence requirements scoped to the given work
    /// order kind or unscoped.
    async fn find_mandatory_requirements(
        &self,
        kind: WorkOrderKind,
    ) -> Result<Vec<EvidenceRequirement>>;

    /// Latest invoice link for the opportunity, if any.
    async fn find_invoice_link(&self, opportunity_id: i64) -> Result<Option<XeroInvoiceLink>>;
}
