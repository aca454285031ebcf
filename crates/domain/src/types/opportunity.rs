//! Opportunity aggregate types
//!
//! The opportunity is the aggregate root for process-engine purposes:
//! quotes, work orders, evidence and QA rows are persisted independently
//! but owned by (and cascade-relevant to) the opportunity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;

/// Ordered sales stage ladder.
///
/// Transitions only move forward or stay equal; the ordering is purely
/// ordinal, so skipping stages is allowed while retreating never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SalesStage {
    New,
    Quoted,
    Accepted,
    Delivery,
    Closed,
}

impl SalesStage {
    /// Position of this stage in the ladder.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether a move from `self` to `to` is permitted (forward or same).
    pub fn allows_transition_to(self, to: Self) -> bool {
        to.index() >= self.index()
    }
}

impl Default for SalesStage {
    fn default() -> Self {
        Self::New
    }
}

impl_status_conversions!(SalesStage {
    New => "New",
    Quoted => "Quoted",
    Accepted => "Accepted",
    Delivery => "Delivery",
    Closed => "Closed",
});

/// Route by which an opportunity is priced and surveyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentPathKind {
    #[serde(rename = "Auto Quote")]
    AutoQuote,
    Desktop,
    #[serde(rename = "Site Survey")]
    SiteSurvey,
}

impl_status_conversions!(AssessmentPathKind {
    AutoQuote => "Auto Quote",
    Desktop => "Desktop",
    SiteSurvey => "Site Survey",
});

/// Assessment path lookup row.
///
/// `requires_survey` is the default applied to opportunities placed on
/// this path; the opportunity keeps its own copy of the flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentPath {
    pub id: i64,
    pub kind: AssessmentPathKind,
    pub requires_survey: bool,
    pub is_active: bool,
}

/// A sales-to-delivery engagement with one customer property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: i64,
    pub name: String,
    pub account_id: i64,
    pub primary_contact_id: Option<i64>,
    pub property_id: i64,
    pub funding_type_id: Option<i64>,
    pub product_offering_id: Option<i64>,
    pub assessment_path_id: Option<i64>,
    pub sales_stage: SalesStage,
    pub requires_survey: bool,
    pub estimated_value: Option<f64>,
    pub quote_status: String,
    pub delivery_status: String,
    pub evidence_status: String,
    pub qa_status: String,
    pub acceptance_date: Option<DateTime<Utc>>,
    pub target_install_window_start: Option<DateTime<Utc>>,
    pub target_install_window_end: Option<DateTime<Utc>>,
    pub payment_requested: bool,
    pub payment_requested_on: Option<DateTime<Utc>>,
    pub payment_link_sent: bool,
    pub payment_link_sent_on: Option<DateTime<Utc>>,
    pub xero_invoice_id: Option<String>,
    pub xero_invoice_number: Option<String>,
    pub xero_invoice_status: Option<String>,
    pub actual_close_date: Option<DateTime<Utc>>,
    pub close_blocked_reason: Option<String>,
    /// Optimistic concurrency token; bumped by every guarded write.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
}

impl Opportunity {
    /// An opportunity with no actual close date is still open.
    pub fn is_open(&self) -> bool {
        self.actual_close_date.is_none()
    }
}

/// Free-text note on the opportunity timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineNote {
    pub id: i64,
    pub opportunity_id: i64,
    pub note: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Mirror of an externally managed invoice; latest sync wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XeroInvoiceLink {
    pub id: i64,
    pub opportunity_id: i64,
    pub xero_invoice_id: Option<String>,
    pub xero_invoice_number: Option<String>,
    pub xero_status: Option<String>,
    pub total: Option<f64>,
    pub sync_error: Option<String>,
    pub last_synced_on: Option<DateTime<Utc>>,
}

impl XeroInvoiceLink {
    /// Whether the link carries a usable invoice number.
    pub fn has_invoice_number(&self) -> bool {
        self.xero_invoice_number.as_deref().is_some_and(|n| !n.is_empty())
    }
}
