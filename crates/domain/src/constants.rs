//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application. Work order progression and gate summaries are free-form
//! strings in the data model, so their canonical values live here.

// Work order progression (minimum guaranteed statuses; the field is free-form)
pub const WORK_ORDER_STATUS_SCHEDULED: &str = "Scheduled";
pub const WORK_ORDER_STATUS_IN_PROGRESS: &str = "In Progress";
pub const WORK_ORDER_STATUS_COMPLETED: &str = "Completed";

// Derived gate summaries stored on work orders
pub const GATE_STATUS_NOT_REQUIRED: &str = "Not Required";
pub const GATE_STATUS_PENDING: &str = "Pending";
pub const GATE_STATUS_COMPLETE: &str = "Complete";

// Lead qualification lifecycle
pub const LEAD_STATUS_NEW: &str = "New";
pub const LEAD_STATUS_QUALIFIED: &str = "Qualified";
pub const LEAD_STATUS_DISQUALIFIED: &str = "Disqualified";

// Lead duplicate screening
pub const DUPLICATE_STATUS_UNIQUE: &str = "Unique";
pub const DUPLICATE_STATUS_POTENTIAL: &str = "Potential Duplicate";

// Defaults applied to freshly qualified opportunities
pub const OPPORTUNITY_QUOTE_STATUS_DRAFT: &str = "Draft";
pub const OPPORTUNITY_DELIVERY_NOT_STARTED: &str = "Not Started";
pub const OPPORTUNITY_EVIDENCE_NOT_REQUIRED: &str = "Not Required";
pub const OPPORTUNITY_QA_NOT_STARTED: &str = "Not Started";

// Quote defaults
pub const QUOTE_TYPE_INITIAL: &str = "Initial";
