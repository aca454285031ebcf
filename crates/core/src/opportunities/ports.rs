//! Port interfaces for opportunity persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_domain::{Opportunity, Result, TimelineNote, XeroInvoiceLink};

/// Patch-style opportunity update.
///
/// `sales_stage` stays a string here; the service validates it against the
/// stage ladder before the write and rejects unrecognized names.
#[derive(Debug, Clone, Default)]
pub struct OpportunityPatch {
    pub name: Option<String>,
    pub assessment_path_id: Option<i64>,
    pub requires_survey: Option<bool>,
    pub sales_stage: Option<String>,
    pub estimated_value: Option<f64>,
    pub target_install_window_start: Option<DateTime<Utc>>,
    pub target_install_window_end: Option<DateTime<Utc>>,
    pub quote_status: Option<String>,
    pub delivery_status: Option<String>,
    pub evidence_status: Option<String>,
    pub qa_status: Option<String>,
    pub payment_link_sent: Option<bool>,
    pub payment_link_sent_on: Option<DateTime<Utc>>,
    pub payment_requested: Option<bool>,
    pub payment_requested_on: Option<DateTime<Utc>>,
}

/// External invoice mirror fields.
#[derive(Debug, Clone, Default)]
pub struct InvoiceLinkUpdate {
    pub xero_invoice_id: Option<String>,
    pub xero_invoice_number: Option<String>,
    pub xero_status: Option<String>,
    pub total: Option<f64>,
    pub sync_error: Option<String>,
}

/// Trait for persisting opportunities and their satellite rows.
#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    /// Fetch an opportunity.
    async fn find_opportunity(&self, opportunity_id: i64) -> Result<Option<Opportunity>>;

    /// Apply a patch-style update.
    async fn update_opportunity(
        &self,
        opportunity_id: i64,
        patch: OpportunityPatch,
    ) -> Result<Opportunity>;

    /// Close the opportunity: stage Closed, actual close date set, close
    /// blocked reason cleared. Bumps the revision; mismatch is a conflict.
    async fn close_opportunity(
        &self,
        opportunity_id: i64,
        closed_at: DateTime<Utc>,
        expected_revision: i64,
    ) -> Result<Opportunity>;

    /// Upsert the invoice link and mirror its fields onto the opportunity.
    async fn upsert_invoice_link(
        &self,
        opportunity_id: i64,
        update: InvoiceLinkUpdate,
        synced_at: DateTime<Utc>,
    ) -> Result<XeroInvoiceLink>;

    /// Append a timeline note.
    async fn add_timeline_note(
        &self,
        opportunity_id: i64,
        note: String,
        created_by: Option<String>,
    ) -> Result<TimelineNote>;

    /// Timeline notes for an opportunity, oldest first.
    async fn list_timeline(&self, opportunity_id: i64) -> Result<Vec<TimelineNote>>;
}
