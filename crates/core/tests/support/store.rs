//! In-memory mock repository implementations for testing
//!
//! Provides a single in-memory store implementing every core repository
//! port, enabling deterministic service tests without database
//! dependencies. Seeding helpers build fixture rows with sensible
//! defaults.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_core::evidence::ports::{
    EvidenceRepository, EvidenceReview, NewEvidenceItem, NewEvidenceRequirement,
};
use fieldline_core::leads::ports::{
    DuplicateScan, LeadPatch, LeadRepository, NewLead, QualificationOutcome, QualificationPlan,
};
use fieldline_core::opportunities::ports::{
    InvoiceLinkUpdate, OpportunityPatch, OpportunityRepository,
};
use fieldline_core::payments::ports::{NewPaymentRequest, PaymentRepository};
use fieldline_core::process::ports::{
    InstallWorkOrder, OpportunitySnapshot, ProcessSnapshotRepository, QuoteWithLines,
};
use fieldline_core::qa::ports::{
    NewQaChecklist, NewQaResult, QaRepository, QaResultUpdate,
};
use fieldline_core::quotes::ports::{NewQuote, QuoteAcceptance, QuoteRepository, QuoteUpdate};
use fieldline_core::workorders::ports::{
    NewWorkOrder, WorkOrderRepository, WorkOrderSchedule, WorkOrderStatusUpdate,
};
use fieldline_domain::{
    constants, Account, AssessmentPath, AssessmentPathKind, Contact, EvidenceItem,
    EvidenceRequirement, EvidenceStatus, FieldlineError, Lead, Opportunity, PaymentRequest,
    PaymentStatus, Property, QaChecklist, QaChecklistItem, QaOutcome, QaResult, Quote, QuoteLine,
    QuoteStatus, Result as DomainResult, SalesStage, TimelineNote, WorkOrder, WorkOrderKind,
    XeroInvoiceLink,
};

#[derive(Default)]
struct State {
    next_id: i64,
    opportunities: Vec<Opportunity>,
    assessment_paths: Vec<AssessmentPath>,
    quotes: Vec<Quote>,
    quote_lines: Vec<QuoteLine>,
    work_orders: Vec<WorkOrder>,
    evidence_requirements: Vec<EvidenceRequirement>,
    evidence_items: Vec<EvidenceItem>,
    qa_checklists: Vec<QaChecklist>,
    qa_results: Vec<QaResult>,
    payment_requests: Vec<PaymentRequest>,
    invoice_links: Vec<XeroInvoiceLink>,
    timeline: Vec<TimelineNote>,
    leads: Vec<Lead>,
    accounts: Vec<Account>,
    contacts: Vec<Contact>,
    properties: Vec<Property>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory CRM store implementing every core repository port.
#[derive(Default, Clone)]
pub struct MockCrm {
    state: Arc<Mutex<State>>,
}

impl MockCrm {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("mock state lock poisoned")
    }

    /// Seed an assessment path and return its id.
    pub fn seed_assessment_path(&self, kind: AssessmentPathKind) -> i64 {
        let mut state = self.lock();
        let id = state.next_id();
        state.assessment_paths.push(AssessmentPath {
            id,
            kind,
            requires_survey: kind == AssessmentPathKind::SiteSurvey,
            is_active: true,
        });
        id
    }

    /// Seed an opportunity and return its id.
    pub fn seed_opportunity(
        &self,
        assessment_path_id: Option<i64>,
        requires_survey: bool,
    ) -> i64 {
        let mut state = self.lock();
        let id = state.next_id();
        let property_id = state.next_id();
        state.opportunities.push(Opportunity {
            id,
            name: format!("Opportunity {id}"),
            account_id: 1,
            primary_contact_id: None,
            property_id,
            funding_type_id: None,
            product_offering_id: None,
            assessment_path_id,
            sales_stage: SalesStage::New,
            requires_survey,
            estimated_value: None,
            quote_status: constants::OPPORTUNITY_QUOTE_STATUS_DRAFT.to_string(),
            delivery_status: constants::OPPORTUNITY_DELIVERY_NOT_STARTED.to_string(),
            evidence_status: constants::OPPORTUNITY_EVIDENCE_NOT_REQUIRED.to_string(),
            qa_status: constants::OPPORTUNITY_QA_NOT_STARTED.to_string(),
            acceptance_date: None,
            target_install_window_start: None,
            target_install_window_end: None,
            payment_requested: false,
            payment_requested_on: None,
            payment_link_sent: false,
            payment_link_sent_on: None,
            xero_invoice_id: None,
            xero_invoice_number: None,
            xero_invoice_status: None,
            actual_close_date: None,
            close_blocked_reason: None,
            revision: 0,
            created_at: Utc::now(),
        });
        id
    }

    /// Seed a work order and return its id.
    pub fn seed_work_order(&self, opportunity_id: i64, kind: WorkOrderKind, status: &str) -> i64 {
        let mut state = self.lock();
        let id = state.next_id();
        state.work_orders.push(WorkOrder {
            id,
            opportunity_id,
            property_id: 0,
            kind,
            funding_type_id: None,
            status: status.to_string(),
            substatus: None,
            completion_blocked_reason: None,
            evidence_required: false,
            evidence_gate_status: constants::GATE_STATUS_NOT_REQUIRED.to_string(),
            qa_gate_status: constants::GATE_STATUS_PENDING.to_string(),
            scheduled_start: None,
            scheduled_end: None,
            actual_start: None,
            actual_end: None,
            created_at: Utc::now(),
        });
        id
    }

    /// Seed an accepted quote with a single line and return its id.
    pub fn seed_accepted_quote(&self, opportunity_id: i64) -> i64 {
        let mut state = self.lock();
        let id = state.next_id();
        state.quotes.push(Quote {
            id,
            opportunity_id,
            property_id: None,
            name: format!("Quote {id}"),
            quote_type: constants::QUOTE_TYPE_INITIAL.to_string(),
            status: QuoteStatus::Accepted,
            total_amount: 100.0,
            sent_on: None,
            accepted_on: Some(Utc::now()),
            acceptance_method: Some("Signature".to_string()),
            customer_proof: None,
            created_at: Utc::now(),
        });
        let line_id = state.next_id();
        state.quote_lines.push(QuoteLine {
            id: line_id,
            quote_id: id,
            description: "Line".to_string(),
            quantity: 1.0,
            unit_price: 100.0,
            line_total: 100.0,
        });
        id
    }

    /// Seed a mandatory evidence requirement and return its id.
    pub fn seed_requirement(
        &self,
        name: &str,
        kind: Option<WorkOrderKind>,
        required_count: i64,
    ) -> i64 {
        let mut state = self.lock();
        let id = state.next_id();
        state.evidence_requirements.push(EvidenceRequirement {
            id,
            name: name.to_string(),
            product_offering_id: None,
            work_order_kind: kind,
            funding_type_id: None,
            evidence_category_id: None,
            required_count,
            mandatory: true,
            sort_order: 0,
            is_active: true,
        });
        id
    }

    /// Seed an approved evidence item against a requirement.
    pub fn seed_approved_evidence(&self, work_order_id: i64, requirement_id: i64) -> i64 {
        let mut state = self.lock();
        let id = state.next_id();
        let opportunity_id = state
            .work_orders
            .iter()
            .find(|wo| wo.id == work_order_id)
            .map(|wo| wo.opportunity_id)
            .unwrap_or_default();
        state.evidence_items.push(EvidenceItem {
            id,
            name: format!("Evidence {id}"),
            opportunity_id,
            work_order_id,
            property_id: None,
            requirement_id: Some(requirement_id),
            evidence_type_id: None,
            status: EvidenceStatus::Approved,
            file_path: Some(format!("/uploads/evidence-{id}.jpg")),
            captured_on: Some(Utc::now()),
            reviewer: None,
            reviewed_on: Some(Utc::now()),
            rejection_reason: None,
            notes: None,
            created_at: Utc::now(),
        });
        id
    }

    /// Seed a QA result with the given outcome and return its id.
    pub fn seed_qa_result(&self, work_order_id: i64, outcome: QaOutcome) -> i64 {
        let mut state = self.lock();
        let id = state.next_id();
        let opportunity_id = state
            .work_orders
            .iter()
            .find(|wo| wo.id == work_order_id)
            .map(|wo| wo.opportunity_id)
            .unwrap_or_default();
        state.qa_results.push(QaResult {
            id,
            opportunity_id,
            work_order_id,
            checklist_item_id: 0,
            outcome,
            notes: None,
            checked_by: None,
            checked_on: Some(Utc::now()),
        });
        id
    }

    /// Seed a QA checklist with the given item texts and return its id.
    pub fn seed_checklist(&self, kind: Option<WorkOrderKind>, items: &[&str]) -> i64 {
        let mut state = self.lock();
        let id = state.next_id();
        let checklist_items = items
            .iter()
            .enumerate()
            .map(|(index, text)| QaChecklistItem {
                id: id * 100 + index as i64,
                checklist_id: id,
                item_text: (*text).to_string(),
                mandatory: true,
                sort_order: index as i64,
            })
            .collect();
        state.qa_checklists.push(QaChecklist {
            id,
            name: format!("Checklist {id}"),
            product_offering_id: None,
            work_order_kind: kind,
            is_active: true,
            items: checklist_items,
        });
        id
    }

    /// Mark an opportunity closed directly (bypassing the close guard).
    pub fn force_close_opportunity(&self, opportunity_id: i64) {
        let mut state = self.lock();
        if let Some(opportunity) =
            state.opportunities.iter_mut().find(|o| o.id == opportunity_id)
        {
            opportunity.actual_close_date = Some(Utc::now());
            opportunity.sales_stage = SalesStage::Closed;
        }
    }

    /// Current revision of an opportunity.
    pub fn revision_of(&self, opportunity_id: i64) -> i64 {
        self.lock()
            .opportunities
            .iter()
            .find(|o| o.id == opportunity_id)
            .map(|o| o.revision)
            .unwrap_or_default()
    }

    fn bump_revision(state: &mut State, opportunity_id: i64, expected: i64) -> DomainResult<()> {
        let opportunity = state
            .opportunities
            .iter_mut()
            .find(|o| o.id == opportunity_id)
            .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))?;
        if opportunity.revision != expected {
            return Err(FieldlineError::Conflict(format!(
                "opportunity {opportunity_id} was modified concurrently"
            )));
        }
        opportunity.revision += 1;
        Ok(())
    }

    fn quote_with_lines(state: &State, quote: &Quote) -> QuoteWithLines {
        QuoteWithLines {
            quote: quote.clone(),
            lines: state
                .quote_lines
                .iter()
                .filter(|line| line.quote_id == quote.id)
                .cloned()
                .collect(),
        }
    }
}

#[async_trait]
impl ProcessSnapshotRepository for MockCrm {
    async fn load_snapshot(&self, opportunity_id: i64) -> DomainResult<Option<OpportunitySnapshot>> {
        let state = self.lock();
        let Some(opportunity) =
            state.opportunities.iter().find(|o| o.id == opportunity_id).cloned()
        else {
            return Ok(None);
        };
        let assessment_path = opportunity
            .assessment_path_id
            .and_then(|id| state.assessment_paths.iter().find(|p| p.id == id).cloned());
        let quotes = state
            .quotes
            .iter()
            .filter(|q| q.opportunity_id == opportunity_id)
            .map(|q| Self::quote_with_lines(&state, q))
            .collect();
        let work_orders = state
            .work_orders
            .iter()
            .filter(|wo| wo.opportunity_id == opportunity_id)
            .cloned()
            .collect();
        Ok(Some(OpportunitySnapshot { opportunity, assessment_path, quotes, work_orders }))
    }

    async fn find_install_orders(&self, opportunity_id: i64) -> DomainResult<Vec<InstallWorkOrder>> {
        let state = self.lock();
        Ok(state
            .work_orders
            .iter()
            .filter(|wo| {
                wo.opportunity_id == opportunity_id && wo.kind == WorkOrderKind::Install
            })
            .map(|wo| InstallWorkOrder {
                work_order: wo.clone(),
                evidence_items: state
                    .evidence_items
                    .iter()
                    .filter(|item| item.work_order_id == wo.id)
                    .cloned()
                    .collect(),
                qa_results: state
                    .qa_results
                    .iter()
                    .filter(|result| result.work_order_id == wo.id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn find_mandatory_requirements(
        &self,
        kind: WorkOrderKind,
    ) -> DomainResult<Vec<EvidenceRequirement>> {
        let state = self.lock();
        Ok(state
            .evidence_requirements
            .iter()
            .filter(|req| {
                req.mandatory
                    && req.is_active
                    && (req.work_order_kind.is_none() || req.work_order_kind == Some(kind))
            })
            .cloned()
            .collect())
    }

    async fn find_invoice_link(&self, opportunity_id: i64) -> DomainResult<Option<XeroInvoiceLink>> {
        let state = self.lock();
        Ok(state.invoice_links.iter().find(|l| l.opportunity_id == opportunity_id).cloned())
    }
}

#[async_trait]
impl QuoteRepository for MockCrm {
    async fn insert_quote(&self, quote: NewQuote, expected_revision: i64) -> DomainResult<Quote> {
        let mut state = self.lock();
        Self::bump_revision(&mut state, quote.opportunity_id, expected_revision)?;
        let id = state.next_id();
        let created = Quote {
            id,
            opportunity_id: quote.opportunity_id,
            property_id: quote.property_id,
            name: quote.name,
            quote_type: quote
                .quote_type
                .unwrap_or_else(|| constants::QUOTE_TYPE_INITIAL.to_string()),
            status: QuoteStatus::Draft,
            total_amount: 0.0,
            sent_on: None,
            accepted_on: None,
            acceptance_method: None,
            customer_proof: None,
            created_at: Utc::now(),
        };
        state.quotes.push(created.clone());
        Ok(created)
    }

    async fn find_quote(&self, quote_id: i64) -> DomainResult<Option<Quote>> {
        Ok(self.lock().quotes.iter().find(|q| q.id == quote_id).cloned())
    }

    async fn find_quote_with_lines(&self, quote_id: i64) -> DomainResult<Option<QuoteWithLines>> {
        let state = self.lock();
        Ok(state
            .quotes
            .iter()
            .find(|q| q.id == quote_id)
            .map(|q| Self::quote_with_lines(&state, q)))
    }

    async fn update_quote(&self, quote_id: i64, update: QuoteUpdate) -> DomainResult<Quote> {
        let mut state = self.lock();
        let quote = state
            .quotes
            .iter_mut()
            .find(|q| q.id == quote_id)
            .ok_or_else(|| FieldlineError::NotFound("Quote not found".into()))?;
        if let Some(name) = update.name {
            quote.name = name;
        }
        if let Some(quote_type) = update.quote_type {
            quote.quote_type = quote_type;
        }
        if let Some(status) = update.status {
            quote.status = status;
        }
        if let Some(sent_on) = update.sent_on {
            quote.sent_on = Some(sent_on);
        }
        Ok(quote.clone())
    }

    async fn add_line(
        &self,
        quote_id: i64,
        description: String,
        quantity: f64,
        unit_price: f64,
        line_total: f64,
    ) -> DomainResult<QuoteLine> {
        let mut state = self.lock();
        let id = state.next_id();
        let line = QuoteLine { id, quote_id, description, quantity, unit_price, line_total };
        state.quote_lines.push(line.clone());
        let total: f64 = state
            .quote_lines
            .iter()
            .filter(|l| l.quote_id == quote_id)
            .map(|l| l.line_total)
            .sum();
        if let Some(quote) = state.quotes.iter_mut().find(|q| q.id == quote_id) {
            quote.total_amount = total;
        }
        Ok(line)
    }

    async fn accept_quote(
        &self,
        quote_id: i64,
        acceptance: QuoteAcceptance,
        accepted_at: DateTime<Utc>,
    ) -> DomainResult<Quote> {
        let mut state = self.lock();
        let opportunity_id = {
            let quote = state
                .quotes
                .iter_mut()
                .find(|q| q.id == quote_id)
                .ok_or_else(|| FieldlineError::NotFound("Quote not found".into()))?;
            quote.status = QuoteStatus::Accepted;
            quote.accepted_on = Some(accepted_at);
            quote.acceptance_method = Some(acceptance.acceptance_method);
            quote.customer_proof = acceptance.customer_proof;
            quote.opportunity_id
        };
        if let Some(opportunity) =
            state.opportunities.iter_mut().find(|o| o.id == opportunity_id)
        {
            opportunity.quote_status = "Accepted".to_string();
            opportunity.acceptance_date = Some(accepted_at);
            opportunity.revision += 1;
        }
        let quote = state
            .quotes
            .iter()
            .find(|q| q.id == quote_id)
            .cloned()
            .ok_or_else(|| FieldlineError::NotFound("Quote not found".into()))?;
        Ok(quote)
    }

    async fn list_for_opportunity(&self, opportunity_id: i64) -> DomainResult<Vec<QuoteWithLines>> {
        let state = self.lock();
        Ok(state
            .quotes
            .iter()
            .filter(|q| q.opportunity_id == opportunity_id)
            .map(|q| Self::quote_with_lines(&state, q))
            .collect())
    }
}

#[async_trait]
impl WorkOrderRepository for MockCrm {
    async fn insert_work_order(
        &self,
        order: NewWorkOrder,
        property_id: i64,
        funding_type_id: Option<i64>,
        expected_revision: i64,
    ) -> DomainResult<WorkOrder> {
        let mut state = self.lock();
        Self::bump_revision(&mut state, order.opportunity_id, expected_revision)?;
        let id = state.next_id();
        let created = WorkOrder {
            id,
            opportunity_id: order.opportunity_id,
            property_id,
            kind: order.kind,
            funding_type_id,
            status: constants::WORK_ORDER_STATUS_SCHEDULED.to_string(),
            substatus: None,
            completion_blocked_reason: None,
            evidence_required: order.evidence_required,
            evidence_gate_status: if order.evidence_required {
                constants::GATE_STATUS_PENDING.to_string()
            } else {
                constants::GATE_STATUS_NOT_REQUIRED.to_string()
            },
            qa_gate_status: constants::GATE_STATUS_PENDING.to_string(),
            scheduled_start: None,
            scheduled_end: None,
            actual_start: None,
            actual_end: None,
            created_at: Utc::now(),
        };
        state.work_orders.push(created.clone());
        Ok(created)
    }

    async fn find_work_order(&self, work_order_id: i64) -> DomainResult<Option<WorkOrder>> {
        Ok(self.lock().work_orders.iter().find(|wo| wo.id == work_order_id).cloned())
    }

    async fn schedule(
        &self,
        work_order_id: i64,
        schedule: WorkOrderSchedule,
    ) -> DomainResult<WorkOrder> {
        let mut state = self.lock();
        let order = state
            .work_orders
            .iter_mut()
            .find(|wo| wo.id == work_order_id)
            .ok_or_else(|| FieldlineError::NotFound("Work order not found".into()))?;
        order.scheduled_start = Some(schedule.scheduled_start);
        order.scheduled_end = Some(schedule.scheduled_end);
        Ok(order.clone())
    }

    async fn update_status(
        &self,
        work_order_id: i64,
        update: WorkOrderStatusUpdate,
    ) -> DomainResult<WorkOrder> {
        let mut state = self.lock();
        let order = state
            .work_orders
            .iter_mut()
            .find(|wo| wo.id == work_order_id)
            .ok_or_else(|| FieldlineError::NotFound("Work order not found".into()))?;
        order.status = update.status;
        order.substatus = update.substatus;
        order.completion_blocked_reason = update.completion_blocked_reason;
        if let Some(actual_start) = update.actual_start {
            order.actual_start = Some(actual_start);
        }
        if let Some(actual_end) = update.actual_end {
            order.actual_end = Some(actual_end);
        }
        Ok(order.clone())
    }

    async fn list_for_opportunity(&self, opportunity_id: i64) -> DomainResult<Vec<WorkOrder>> {
        Ok(self
            .lock()
            .work_orders
            .iter()
            .filter(|wo| wo.opportunity_id == opportunity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OpportunityRepository for MockCrm {
    async fn find_opportunity(&self, opportunity_id: i64) -> DomainResult<Option<Opportunity>> {
        Ok(self.lock().opportunities.iter().find(|o| o.id == opportunity_id).cloned())
    }

    async fn update_opportunity(
        &self,
        opportunity_id: i64,
        patch: OpportunityPatch,
    ) -> DomainResult<Opportunity> {
        let mut state = self.lock();
        let opportunity = state
            .opportunities
            .iter_mut()
            .find(|o| o.id == opportunity_id)
            .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))?;
        if let Some(name) = patch.name {
            opportunity.name = name;
        }
        if let Some(path_id) = patch.assessment_path_id {
            opportunity.assessment_path_id = Some(path_id);
        }
        if let Some(requires_survey) = patch.requires_survey {
            opportunity.requires_survey = requires_survey;
        }
        if let Some(stage) = patch.sales_stage {
            opportunity.sales_stage = stage
                .parse()
                .map_err(FieldlineError::InvalidInput)?;
        }
        if let Some(value) = patch.estimated_value {
            opportunity.estimated_value = Some(value);
        }
        if let Some(status) = patch.quote_status {
            opportunity.quote_status = status;
        }
        if let Some(status) = patch.delivery_status {
            opportunity.delivery_status = status;
        }
        if let Some(status) = patch.evidence_status {
            opportunity.evidence_status = status;
        }
        if let Some(status) = patch.qa_status {
            opportunity.qa_status = status;
        }
        if let Some(sent) = patch.payment_link_sent {
            opportunity.payment_link_sent = sent;
        }
        if let Some(requested) = patch.payment_requested {
            opportunity.payment_requested = requested;
        }
        Ok(opportunity.clone())
    }

    async fn close_opportunity(
        &self,
        opportunity_id: i64,
        closed_at: DateTime<Utc>,
        expected_revision: i64,
    ) -> DomainResult<Opportunity> {
        let mut state = self.lock();
        Self::bump_revision(&mut state, opportunity_id, expected_revision)?;
        let opportunity = state
            .opportunities
            .iter_mut()
            .find(|o| o.id == opportunity_id)
            .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))?;
        opportunity.sales_stage = SalesStage::Closed;
        opportunity.actual_close_date = Some(closed_at);
        opportunity.close_blocked_reason = None;
        Ok(opportunity.clone())
    }

    async fn upsert_invoice_link(
        &self,
        opportunity_id: i64,
        update: InvoiceLinkUpdate,
        synced_at: DateTime<Utc>,
    ) -> DomainResult<XeroInvoiceLink> {
        let mut state = self.lock();
        let id = state.next_id();
        let link = if let Some(existing) =
            state.invoice_links.iter_mut().find(|l| l.opportunity_id == opportunity_id)
        {
            existing.xero_invoice_id = update.xero_invoice_id.clone();
            existing.xero_invoice_number = update.xero_invoice_number.clone();
            existing.xero_status = update.xero_status.clone();
            existing.total = update.total;
            existing.sync_error = update.sync_error.clone();
            existing.last_synced_on = Some(synced_at);
            existing.clone()
        } else {
            let link = XeroInvoiceLink {
                id,
                opportunity_id,
                xero_invoice_id: update.xero_invoice_id.clone(),
                xero_invoice_number: update.xero_invoice_number.clone(),
                xero_status: update.xero_status.clone(),
                total: update.total,
                sync_error: update.sync_error.clone(),
                last_synced_on: Some(synced_at),
            };
            state.invoice_links.push(link.clone());
            link
        };
        if let Some(opportunity) =
            state.opportunities.iter_mut().find(|o| o.id == opportunity_id)
        {
            opportunity.xero_invoice_id = update.xero_invoice_id;
            opportunity.xero_invoice_number = update.xero_invoice_number;
            opportunity.xero_invoice_status = update.xero_status;
        }
        Ok(link)
    }

    async fn add_timeline_note(
        &self,
        opportunity_id: i64,
        note: String,
        created_by: Option<String>,
    ) -> DomainResult<TimelineNote> {
        let mut state = self.lock();
        let id = state.next_id();
        let row = TimelineNote { id, opportunity_id, note, created_by, created_at: Utc::now() };
        state.timeline.push(row.clone());
        Ok(row)
    }

    async fn list_timeline(&self, opportunity_id: i64) -> DomainResult<Vec<TimelineNote>> {
        Ok(self
            .lock()
            .timeline
            .iter()
            .filter(|n| n.opportunity_id == opportunity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EvidenceRepository for MockCrm {
    async fn insert_requirement(
        &self,
        requirement: NewEvidenceRequirement,
    ) -> DomainResult<EvidenceRequirement> {
        let mut state = self.lock();
        let id = state.next_id();
        let created = EvidenceRequirement {
            id,
            name: requirement.name,
            product_offering_id: requirement.product_offering_id,
            work_order_kind: requirement.work_order_kind,
            funding_type_id: requirement.funding_type_id,
            evidence_category_id: requirement.evidence_category_id,
            required_count: requirement.required_count,
            mandatory: requirement.mandatory,
            sort_order: requirement.sort_order,
            is_active: true,
        };
        state.evidence_requirements.push(created.clone());
        Ok(created)
    }

    async fn find_applicable_requirements(
        &self,
        kind: WorkOrderKind,
        product_offering_id: Option<i64>,
        funding_type_id: Option<i64>,
    ) -> DomainResult<Vec<EvidenceRequirement>> {
        let state = self.lock();
        let mut requirements: Vec<EvidenceRequirement> = state
            .evidence_requirements
            .iter()
            .filter(|req| {
                req.is_active
                    && (req.work_order_kind.is_none() || req.work_order_kind == Some(kind))
                    && (req.product_offering_id.is_none()
                        || req.product_offering_id == product_offering_id)
                    && (req.funding_type_id.is_none()
                        || req.funding_type_id == funding_type_id)
            })
            .cloned()
            .collect();
        requirements.sort_by_key(|req| (req.sort_order, req.id));
        Ok(requirements)
    }

    async fn insert_item(&self, item: NewEvidenceItem) -> DomainResult<EvidenceItem> {
        let mut state = self.lock();
        let id = state.next_id();
        let created = EvidenceItem {
            id,
            name: item.name,
            opportunity_id: item.opportunity_id,
            work_order_id: item.work_order_id,
            property_id: item.property_id,
            requirement_id: item.requirement_id,
            evidence_type_id: item.evidence_type_id,
            status: EvidenceStatus::Pending,
            file_path: None,
            captured_on: None,
            reviewer: None,
            reviewed_on: None,
            rejection_reason: None,
            notes: None,
            created_at: Utc::now(),
        };
        state.evidence_items.push(created.clone());
        Ok(created)
    }

    async fn find_item(&self, item_id: i64) -> DomainResult<Option<EvidenceItem>> {
        Ok(self.lock().evidence_items.iter().find(|i| i.id == item_id).cloned())
    }

    async fn attach_file(
        &self,
        item_id: i64,
        file_path: String,
        captured_at: DateTime<Utc>,
    ) -> DomainResult<EvidenceItem> {
        let mut state = self.lock();
        let item = state
            .evidence_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| FieldlineError::NotFound("Evidence item not found".into()))?;
        item.file_path = Some(file_path);
        item.captured_on = Some(captured_at);
        item.status = EvidenceStatus::Submitted;
        Ok(item.clone())
    }

    async fn update_item_review(
        &self,
        item_id: i64,
        review: EvidenceReview,
        reviewed_at: DateTime<Utc>,
    ) -> DomainResult<EvidenceItem> {
        let mut state = self.lock();
        let item = state
            .evidence_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| FieldlineError::NotFound("Evidence item not found".into()))?;
        item.status = review.status;
        item.reviewer = review.reviewer;
        item.rejection_reason = review.rejection_reason;
        item.notes = review.notes;
        item.reviewed_on = Some(reviewed_at);
        Ok(item.clone())
    }

    async fn list_for_work_order(&self, work_order_id: i64) -> DomainResult<Vec<EvidenceItem>> {
        Ok(self
            .lock()
            .evidence_items
            .iter()
            .filter(|i| i.work_order_id == work_order_id)
            .cloned()
            .collect())
    }

    async fn set_evidence_gate_status(
        &self,
        work_order_id: i64,
        status: &str,
    ) -> DomainResult<()> {
        let mut state = self.lock();
        if let Some(order) = state.work_orders.iter_mut().find(|wo| wo.id == work_order_id) {
            order.evidence_gate_status = status.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl QaRepository for MockCrm {
    async fn insert_checklist(&self, checklist: NewQaChecklist) -> DomainResult<QaChecklist> {
        let mut state = self.lock();
        let id = state.next_id();
        let items = checklist
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| QaChecklistItem {
                id: id * 100 + index as i64,
                checklist_id: id,
                item_text: item.item_text,
                mandatory: item.mandatory,
                sort_order: item.sort_order,
            })
            .collect();
        let created = QaChecklist {
            id,
            name: checklist.name,
            product_offering_id: checklist.product_offering_id,
            work_order_kind: checklist.work_order_kind,
            is_active: true,
            items,
        };
        state.qa_checklists.push(created.clone());
        Ok(created)
    }

    async fn find_applicable_checklist(
        &self,
        kind: WorkOrderKind,
        product_offering_id: Option<i64>,
    ) -> DomainResult<Option<QaChecklist>> {
        let state = self.lock();
        Ok(state
            .qa_checklists
            .iter()
            .find(|checklist| {
                checklist.is_active
                    && (checklist.work_order_kind.is_none()
                        || checklist.work_order_kind == Some(kind))
                    && (checklist.product_offering_id.is_none()
                        || checklist.product_offering_id == product_offering_id)
            })
            .cloned())
    }

    async fn find_result_for_item(
        &self,
        work_order_id: i64,
        checklist_item_id: i64,
    ) -> DomainResult<Option<QaResult>> {
        Ok(self
            .lock()
            .qa_results
            .iter()
            .find(|r| r.work_order_id == work_order_id && r.checklist_item_id == checklist_item_id)
            .cloned())
    }

    async fn insert_result(&self, result: NewQaResult) -> DomainResult<QaResult> {
        let mut state = self.lock();
        let id = state.next_id();
        let created = QaResult {
            id,
            opportunity_id: result.opportunity_id,
            work_order_id: result.work_order_id,
            checklist_item_id: result.checklist_item_id,
            outcome: QaOutcome::NotApplicable,
            notes: None,
            checked_by: None,
            checked_on: None,
        };
        state.qa_results.push(created.clone());
        Ok(created)
    }

    async fn find_result(&self, result_id: i64) -> DomainResult<Option<QaResult>> {
        Ok(self.lock().qa_results.iter().find(|r| r.id == result_id).cloned())
    }

    async fn update_result(
        &self,
        result_id: i64,
        update: QaResultUpdate,
        checked_at: DateTime<Utc>,
    ) -> DomainResult<QaResult> {
        let mut state = self.lock();
        let result = state
            .qa_results
            .iter_mut()
            .find(|r| r.id == result_id)
            .ok_or_else(|| FieldlineError::NotFound("QA result not found".into()))?;
        result.outcome = update.outcome;
        result.notes = update.notes;
        result.checked_by = update.checked_by;
        result.checked_on = Some(checked_at);
        Ok(result.clone())
    }

    async fn list_for_work_order(&self, work_order_id: i64) -> DomainResult<Vec<QaResult>> {
        Ok(self
            .lock()
            .qa_results
            .iter()
            .filter(|r| r.work_order_id == work_order_id)
            .cloned()
            .collect())
    }

    async fn set_qa_gate_status(&self, work_order_id: i64, status: &str) -> DomainResult<()> {
        let mut state = self.lock();
        if let Some(order) = state.work_orders.iter_mut().find(|wo| wo.id == work_order_id) {
            order.qa_gate_status = status.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for MockCrm {
    async fn insert_request(
        &self,
        opportunity_id: i64,
        property_id: Option<i64>,
        request: NewPaymentRequest,
        requested_at: DateTime<Utc>,
        expected_revision: i64,
    ) -> DomainResult<PaymentRequest> {
        let mut state = self.lock();
        Self::bump_revision(&mut state, opportunity_id, expected_revision)?;
        let id = state.next_id();
        let status =
            if request.payment_link_url.is_some() { PaymentStatus::Sent } else { PaymentStatus::NotSent };
        let link_sent_on = request.payment_link_url.as_ref().map(|_| requested_at);
        let created = PaymentRequest {
            id,
            opportunity_id,
            property_id,
            amount_requested: request.amount_requested,
            payment_link_url: request.payment_link_url,
            payment_link_sent_on: link_sent_on,
            sent_by: request.sent_by,
            status,
            paid_on: None,
            notes: request.notes,
            created_at: requested_at,
        };
        state.payment_requests.push(created.clone());
        if let Some(opportunity) =
            state.opportunities.iter_mut().find(|o| o.id == opportunity_id)
        {
            opportunity.payment_requested = true;
            opportunity.payment_requested_on = Some(requested_at);
        }
        Ok(created)
    }

    async fn find_request(&self, request_id: i64) -> DomainResult<Option<PaymentRequest>> {
        Ok(self.lock().payment_requests.iter().find(|r| r.id == request_id).cloned())
    }

    async fn update_status(
        &self,
        request_id: i64,
        status: PaymentStatus,
        paid_on: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> DomainResult<PaymentRequest> {
        let mut state = self.lock();
        let request = state
            .payment_requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| FieldlineError::NotFound("Payment request not found".into()))?;
        request.status = status;
        if paid_on.is_some() {
            request.paid_on = paid_on;
        }
        if notes.is_some() {
            request.notes = notes;
        }
        Ok(request.clone())
    }

    async fn list_for_opportunity(
        &self,
        opportunity_id: i64,
    ) -> DomainResult<Vec<PaymentRequest>> {
        let mut requests: Vec<PaymentRequest> = self
            .lock()
            .payment_requests
            .iter()
            .filter(|r| r.opportunity_id == opportunity_id)
            .cloned()
            .collect();
        requests.reverse();
        Ok(requests)
    }
}

#[async_trait]
impl LeadRepository for MockCrm {
    async fn insert_lead(&self, lead: NewLead) -> DomainResult<Lead> {
        let mut state = self.lock();
        let id = state.next_id();
        let created = Lead {
            id,
            full_name: lead.full_name,
            company_name: lead.company_name,
            phone: lead.phone,
            email: lead.email,
            source_id: lead.source_id,
            campaign_id: lead.campaign_id,
            funding_type_id: lead.funding_type_id,
            interested_product_id: lead.interested_product_id,
            property_address_line1: lead.property_address_line1,
            property_address_line2: lead.property_address_line2,
            property_city: lead.property_city,
            property_postcode: lead.property_postcode,
            property_country: lead.property_country,
            notes: lead.notes,
            qualification_status: lead.qualification_status,
            disqualification_reason: None,
            duplicate_status: lead.duplicate_status,
            duplicate_of_lead_id: lead.duplicate_of_lead_id,
            qualified_account_id: None,
            qualified_contact_id: None,
            qualified_property_id: None,
            qualified_opportunity_id: None,
            created_at: Utc::now(),
        };
        state.leads.push(created.clone());
        Ok(created)
    }

    async fn find_lead(&self, lead_id: i64) -> DomainResult<Option<Lead>> {
        Ok(self.lock().leads.iter().find(|l| l.id == lead_id).cloned())
    }

    async fn update_lead(&self, lead_id: i64, patch: LeadPatch) -> DomainResult<Lead> {
        let mut state = self.lock();
        let lead = state
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .ok_or_else(|| FieldlineError::NotFound("Lead not found".into()))?;
        if patch.full_name.is_some() {
            lead.full_name = patch.full_name;
        }
        if patch.company_name.is_some() {
            lead.company_name = patch.company_name;
        }
        if patch.phone.is_some() {
            lead.phone = patch.phone;
        }
        if patch.email.is_some() {
            lead.email = patch.email;
        }
        if patch.funding_type_id.is_some() {
            lead.funding_type_id = patch.funding_type_id;
        }
        if patch.interested_product_id.is_some() {
            lead.interested_product_id = patch.interested_product_id;
        }
        if patch.notes.is_some() {
            lead.notes = patch.notes;
        }
        Ok(lead.clone())
    }

    async fn scan_duplicates(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        exclude_lead_id: Option<i64>,
    ) -> DomainResult<DuplicateScan> {
        let state = self.lock();
        let matched_lead_id = state
            .leads
            .iter()
            .filter(|l| Some(l.id) != exclude_lead_id)
            .filter(|l| {
                (email.is_some() && l.email.as_deref() == email)
                    || (phone.is_some() && l.phone.as_deref() == phone)
            })
            .map(|l| l.id)
            .next_back();
        let matched_contact_id = state
            .contacts
            .iter()
            .filter(|c| {
                (email.is_some() && c.email.as_deref() == email)
                    || (phone.is_some() && c.mobile.as_deref() == phone)
            })
            .map(|c| c.id)
            .next_back();
        Ok(DuplicateScan { matched_lead_id, matched_contact_id })
    }

    async fn set_duplicate_status(
        &self,
        lead_id: i64,
        status: &str,
        duplicate_of_lead_id: Option<i64>,
    ) -> DomainResult<Lead> {
        let mut state = self.lock();
        let lead = state
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .ok_or_else(|| FieldlineError::NotFound("Lead not found".into()))?;
        lead.duplicate_status = status.to_string();
        lead.duplicate_of_lead_id = duplicate_of_lead_id;
        Ok(lead.clone())
    }

    async fn disqualify(&self, lead_id: i64, reason: &str) -> DomainResult<Lead> {
        let mut state = self.lock();
        let lead = state
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .ok_or_else(|| FieldlineError::NotFound("Lead not found".into()))?;
        lead.qualification_status = constants::LEAD_STATUS_DISQUALIFIED.to_string();
        lead.disqualification_reason = Some(reason.to_string());
        Ok(lead.clone())
    }

    async fn qualify(&self, plan: QualificationPlan) -> DomainResult<QualificationOutcome> {
        let mut state = self.lock();

        let account = if let Some(existing) =
            state.accounts.iter().find(|a| a.name == plan.account_name).cloned()
        {
            existing
        } else {
            let id = state.next_id();
            let account = Account {
                id,
                name: plan.account_name.clone(),
                email: plan.email.clone(),
                phone: plan.phone.clone(),
                funding_type_id: plan.funding_type_id,
                account_type: "Customer".to_string(),
                created_at: Utc::now(),
            };
            state.accounts.push(account.clone());
            account
        };

        let contact = if let Some(existing) = state
            .contacts
            .iter()
            .find(|c| {
                c.account_id == account.id
                    && ((plan.email.is_some() && c.email == plan.email)
                        || (plan.phone.is_some() && c.mobile == plan.phone))
            })
            .cloned()
        {
            existing
        } else {
            let id = state.next_id();
            let contact = Contact {
                id,
                account_id: account.id,
                first_name: plan.first_name.clone(),
                last_name: plan.last_name.clone(),
                email: plan.email.clone(),
                mobile: plan.phone.clone(),
                created_at: Utc::now(),
            };
            state.contacts.push(contact.clone());
            contact
        };

        let property = if let Some(existing) = state
            .properties
            .iter()
            .find(|p| {
                p.account_id == account.id
                    && plan.address_line1.is_some()
                    && p.address_line1 == plan.address_line1
            })
            .cloned()
        {
            existing
        } else {
            let id = state.next_id();
            let property = Property {
                id,
                name: plan.property_name.clone(),
                account_id: account.id,
                primary_contact_id: Some(contact.id),
                address_line1: plan.address_line1.clone(),
                address_line2: plan.address_line2.clone(),
                city: plan.city.clone(),
                postcode: plan.postcode.clone(),
                country: plan.country.clone(),
                created_from_lead_id: Some(plan.lead_id),
                created_at: Utc::now(),
            };
            state.properties.push(property.clone());
            property
        };

        let open_exists = state.opportunities.iter().any(|o| {
            o.property_id == property.id
                && o.product_offering_id == plan.product_offering_id
                && o.actual_close_date.is_none()
        });
        if open_exists {
            return Err(FieldlineError::Conflict(
                "Active opportunity already exists for this property/product.".into(),
            ));
        }

        let opportunity_id = state.next_id();
        let opportunity = Opportunity {
            id: opportunity_id,
            name: format!("{} - {}", plan.account_name, property.name),
            account_id: account.id,
            primary_contact_id: Some(contact.id),
            property_id: property.id,
            funding_type_id: plan.funding_type_id,
            product_offering_id: plan.product_offering_id,
            assessment_path_id: None,
            sales_stage: SalesStage::New,
            requires_survey: false,
            estimated_value: None,
            quote_status: constants::OPPORTUNITY_QUOTE_STATUS_DRAFT.to_string(),
            delivery_status: constants::OPPORTUNITY_DELIVERY_NOT_STARTED.to_string(),
            evidence_status: constants::OPPORTUNITY_EVIDENCE_NOT_REQUIRED.to_string(),
            qa_status: constants::OPPORTUNITY_QA_NOT_STARTED.to_string(),
            acceptance_date: None,
            target_install_window_start: None,
            target_install_window_end: None,
            payment_requested: false,
            payment_requested_on: None,
            payment_link_sent: false,
            payment_link_sent_on: None,
            xero_invoice_id: None,
            xero_invoice_number: None,
            xero_invoice_status: None,
            actual_close_date: None,
            close_blocked_reason: None,
            revision: 0,
            created_at: Utc::now(),
        };
        state.opportunities.push(opportunity.clone());

        let lead = state
            .leads
            .iter_mut()
            .find(|l| l.id == plan.lead_id)
            .ok_or_else(|| FieldlineError::NotFound("Lead not found".into()))?;
        lead.qualification_status = constants::LEAD_STATUS_QUALIFIED.to_string();
        lead.qualified_account_id = Some(account.id);
        lead.qualified_contact_id = Some(contact.id);
        lead.qualified_property_id = Some(property.id);
        lead.qualified_opportunity_id = Some(opportunity_id);
        let lead = lead.clone();

        Ok(QualificationOutcome { lead, account, contact, property, opportunity })
    }
}
