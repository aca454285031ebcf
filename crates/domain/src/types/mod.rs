//! Domain types and models

pub mod evidence;
pub mod lead;
pub mod opportunity;
pub mod payment;
pub mod process;
pub mod qa;
pub mod quote;
pub mod work_order;

pub use evidence::{EvidenceItem, EvidenceRequirement, EvidenceStatus};
pub use lead::{Account, Contact, Lead, Property};
pub use opportunity::{
    AssessmentPath, AssessmentPathKind, Opportunity, SalesStage, TimelineNote, XeroInvoiceLink,
};
pub use payment::{PaymentRequest, PaymentStatus};
pub use process::ProcessStatus;
pub use qa::{QaChecklist, QaChecklistItem, QaOutcome, QaResult};
pub use quote::{Quote, QuoteLine, QuoteStatus};
pub use work_order::{WorkOrder, WorkOrderKind};
