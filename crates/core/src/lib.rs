//! # Fieldline Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The opportunity process engine (gates, stage ladder, process status)
//! - Guarded services enforcing process rules at every mutation boundary
//! - Port/adapter interfaces (traits) for the data-access layer
//!
//! ## Architecture Principles
//! - Only depends on `fieldline-domain`
//! - No database or HTTP code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod evidence;
pub mod leads;
pub mod opportunities;
pub mod payments;
pub mod process;
pub mod qa;
pub mod quotes;
pub mod workorders;

// Re-export specific items to avoid ambiguity
pub use evidence::ports::{EvidenceRepository, EvidenceReview, NewEvidenceItem, NewEvidenceRequirement};
pub use evidence::EvidenceService;
pub use leads::ports::{
    DuplicateScan, LeadPatch, LeadRepository, NewLead, QualificationOutcome, QualificationPlan,
};
pub use leads::LeadService;
pub use opportunities::ports::{InvoiceLinkUpdate, OpportunityPatch, OpportunityRepository};
pub use opportunities::OpportunityService;
pub use payments::ports::{NewPaymentRequest, PaymentRepository};
pub use payments::PaymentService;
pub use process::ports::{
    InstallWorkOrder, OpportunitySnapshot, ProcessSnapshotRepository, QuoteWithLines,
};
pub use process::stages::stage_transition_allowed;
pub use process::{DeliveryGate, ProcessEngine};
pub use qa::ports::{NewQaChecklist, NewQaChecklistItem, NewQaResult, QaRepository, QaResultUpdate};
pub use qa::QaService;
pub use quotes::ports::{NewQuote, NewQuoteLine, QuoteAcceptance, QuoteRepository, QuoteUpdate};
pub use quotes::QuoteService;
pub use workorders::ports::{
    NewWorkOrder, WorkOrderRepository, WorkOrderSchedule, WorkOrderStatusUpdate,
};
pub use workorders::WorkOrderService;
